pub mod portfolio;
pub mod settings;
pub mod site_data;
