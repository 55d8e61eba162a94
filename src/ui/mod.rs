pub mod confirm;
pub mod contact_form;
pub mod contact_list;
pub mod shell;
pub mod table;

use crate::api::models::ContactId;

/// Screens of the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    List,
    Add,
    Edit(ContactId),
}
