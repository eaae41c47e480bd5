// Index arithmetic for d-ary heaps stored in arrays.
//
// Every node of an `A`-ary heap has up to `A` children, and the tree is laid
// out level by level. For `A = 4`,
//
// ```text
//                                  0
//          1               2               3               4
//    5  6  7  8      9 10 11 12     13 14 15 16     17 18 19 20
// ```
//
// The last level will often be incomplete.
//
//   - Up:          `(i-1) / A`
//   - First child: `A*i + 1`
//   - Last child:  `A*(i+1)`

/// The parent node
///
/// ```
/// use theta_search::heap_primitives::index_parent;
/// assert_eq!(index_parent::<4>(1), 0);
/// assert_eq!(index_parent::<4>(4), 0);
/// assert_eq!(index_parent::<4>(5), 1);
/// assert_eq!(index_parent::<4>(12), 2);
/// assert_eq!(index_parent::<4>(20), 4);
/// assert_eq!(index_parent::<2>(6), 2);
/// ```
#[inline(always)]
#[must_use]
pub fn index_parent<const A: usize>(i: usize) -> usize {
    debug_assert!(i != 0, "The root has no parent");
    (i - 1) / A
}

/// The first (left-most) child
///
/// ```
/// use theta_search::heap_primitives::index_first_child;
/// assert_eq!(index_first_child::<4>(0), 1);
/// assert_eq!(index_first_child::<4>(1), 5);
/// assert_eq!(index_first_child::<4>(3), 13);
/// assert_eq!(index_first_child::<2>(3), 7);
/// ```
#[inline(always)]
#[must_use]
pub fn index_first_child<const A: usize>(i: usize) -> usize {
    (A * i) + 1
}

/// The last (right-most) child
///
/// ```
/// use theta_search::heap_primitives::index_last_child;
/// assert_eq!(index_last_child::<4>(0), 4);
/// assert_eq!(index_last_child::<4>(1), 8);
/// assert_eq!(index_last_child::<4>(4), 20);
/// assert_eq!(index_last_child::<2>(2), 6);
/// ```
#[inline(always)]
#[must_use]
pub fn index_last_child<const A: usize>(i: usize) -> usize {
    A * (i + 1)
}
