use user_registration_core::record::UserItem;

/// Single-item insert-or-replace into the destination table, keyed by the
/// item's `id` field. Failure details are propagated as text.
pub trait UserStore {
    fn put_user(&self, table_name: &str, item: &UserItem) -> Result<(), String>;
}
