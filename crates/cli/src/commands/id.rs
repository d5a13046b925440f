//! `fieldstate id` — Generate or validate a field id.

use fieldstate_core::FieldId;

pub async fn run(check: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    match check {
        Some(token) => {
            if !FieldId::is_well_formed(&token) {
                return Err(format!("'{token}' is not a well-formed field id").into());
            }
            println!("✅ '{token}' is a well-formed field id");
        }
        None => println!("{}", FieldId::generate()),
    }
    Ok(())
}
