use serde::Serialize;

/// Per-type procedure metadata. Empty strings mean "not configured".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityDescriptor {
    /// Schema-qualified save procedure, e.g. `dbo.UserSave`.
    pub save_procedure: &'static str,
    pub delete_procedure: &'static str,
    /// External name of the field receiving the scalar returned by save.
    pub return_id: &'static str,
}

impl EntityDescriptor {
    pub const fn new(save_procedure: &'static str) -> Self {
        Self {
            save_procedure,
            delete_procedure: "",
            return_id: "",
        }
    }

    pub const fn delete_procedure(mut self, procedure: &'static str) -> Self {
        self.delete_procedure = procedure;
        self
    }

    pub const fn return_id(mut self, external_name: &'static str) -> Self {
        self.return_id = external_name;
        self
    }

    pub fn save(&self) -> Option<&'static str> {
        non_empty(self.save_procedure)
    }

    pub fn delete(&self) -> Option<&'static str> {
        non_empty(self.delete_procedure)
    }

    pub fn returned_id(&self) -> Option<&'static str> {
        non_empty(self.return_id)
    }
}

fn non_empty(name: &'static str) -> Option<&'static str> {
    if name.trim().is_empty() { None } else { Some(name) }
}
