// Heap index arithmetic for an implicit `A`-ary heap.
//
// A heap is a tree-like structure where every subtree's root has a better score
// than all the other nodes in the subtree, stored in an array that's traversed
// in a non-linear way. For `A = 2` these are the indices we assign to each node,
//
// ```text
//                           0
//              1                         2
//       3            4            5             6
//   7      8      9     10    11     12     13     14
// 15 16  17 18  19 20  21 22 23 24  25
// ```
//
// The last level will often be incomplete.

/// The parent node
///
/// ```
/// use informed_search::heap_primitives::index_parent;
/// assert_eq!(index_parent::<2>(1), 0);
/// assert_eq!(index_parent::<2>(2), 0);
/// assert_eq!(index_parent::<2>(25), 12);
/// assert_eq!(index_parent::<4>(4), 0);
/// assert_eq!(index_parent::<4>(5), 1);
/// ```
#[inline(always)]
#[must_use]
pub fn index_parent<const A: usize>(i: usize) -> usize {
    debug_assert!(i > 0, "The root has no parent");
    (i - 1) / A
}

/// The first (left-most) child
///
/// ```
/// use informed_search::heap_primitives::index_first_child;
/// assert_eq!(index_first_child::<2>(0), 1);
/// assert_eq!(index_first_child::<2>(11), 23);
/// assert_eq!(index_first_child::<4>(1), 5);
/// ```
#[inline(always)]
#[must_use]
pub fn index_first_child<const A: usize>(i: usize) -> usize {
    (A * i) + 1
}

/// The children of `i` that exist in a heap of length `len`.
///
/// ```
/// use informed_search::heap_primitives::index_children;
/// assert_eq!(index_children::<4>(0, 10), 1..5);
/// assert_eq!(index_children::<4>(1, 7), 5..7);
/// assert!(index_children::<4>(2, 7).is_empty());
/// ```
#[inline(always)]
#[must_use]
pub fn index_children<const A: usize>(i: usize, len: usize) -> std::ops::Range<usize> {
    let first = index_first_child::<A>(i).min(len);
    first..(first + A).min(len)
}
