use super::{EntityDescriptor, FieldBinding};

/// A type whose fields carry procedure-binding metadata.
///
/// Usually generated with `#[derive(DbEntity)]`; implementing it by hand is
/// the registration path for types the derive cannot see.
///
/// ```ignore
/// #[derive(Default, DbEntity)]
/// #[db_info(save = "dbo.UserSave", return_id = "UserID")]
/// struct User {
///     #[db_field("UserID", save = false, key)]
///     id: i64,
///     #[db_field("UserName")]
///     name: String,
///     // no metadata: invisible to binding and hydration
///     cached_label: String,
/// }
/// ```
pub trait DbEntity: Default + Send + Sync + 'static {
    /// Annotated fields in declaration order.
    fn fields() -> Vec<FieldBinding<Self>>;

    fn entity() -> Option<EntityDescriptor> {
        None
    }
}

pub fn resolve_fields<T: DbEntity>() -> Vec<FieldBinding<T>> {
    T::fields()
}

pub fn resolve_entity<T: DbEntity>() -> Option<EntityDescriptor> {
    T::entity()
}

/// The single binding named `external_name`. Zero or several matches
/// resolve to `None`.
pub fn find_field<'a, T>(
    fields: &'a [FieldBinding<T>],
    external_name: &str,
) -> Option<&'a FieldBinding<T>> {
    let mut matches = fields
        .iter()
        .filter(|field| field.external_name() == external_name);
    let first = matches.next()?;
    if matches.next().is_some() {
        tracing::debug!(
            external_name,
            "external name is declared on more than one field"
        );
        return None;
    }
    Some(first)
}
