pub mod image_payload;
pub mod transaction_record;
