pub mod template_catalog;

pub use template_catalog::{Template, TemplateCatalog};
