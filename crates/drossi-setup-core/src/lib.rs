mod naming;
mod product;

pub use naming::backup_file_name;
pub use product::ProductManifest;
