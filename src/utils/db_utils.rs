/// `?, ?, ?` for an `IN (...)` clause with `n` bound values.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Builds `UPDATE {table} SET {set} WHERE {guard} AND id IN (...)`.
/// The caller binds the SET values first, then the ids in order.
pub fn build_settle_sql(table: &str, set: &str, guard: &str, ids: usize) -> String {
    format!(
        "UPDATE {} SET {} WHERE {} AND id IN ({})",
        table,
        set,
        guard,
        placeholders(ids)
    )
}
