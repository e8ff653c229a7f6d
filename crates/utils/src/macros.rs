/// Iterate a read-only query in `SimId` order. The query tuple must lead
/// with `&SimId` so log lines and side effects replay identically run to run.
#[macro_export]
macro_rules! order_iter {
    ($query:expr) => {{
        let mut items: Vec<_> = $query.iter().collect();
        items.sort_unstable_by_key(|item| (item.0).0);
        items.into_iter()
    }};
}

/// Mutable variant of [`order_iter!`]; same leading `&SimId` contract.
#[macro_export]
macro_rules! order_iter_mut {
    ($query:expr) => {{
        let mut items: Vec<_> = $query.iter_mut().collect();
        items.sort_unstable_by_key(|item| (item.0).0);
        items.into_iter()
    }};
}
