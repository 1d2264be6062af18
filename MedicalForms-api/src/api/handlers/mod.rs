pub mod health;
pub mod medical_records;


// Re-export handlers for easier imports
pub use medical_records::{
    bulk_add_medical_data, create_medical_form, delete_medical_data, get_medical_data,
    list_medical_data, search_medical_data, update_medical_data,
};
pub use health::health_check;
