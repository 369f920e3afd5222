//! services/api/src/bin/openapi.rs
//!
//! Dumps the REST API's OpenAPI 3.0 document to `openapi.json`, for client
//! generators and CI diffing against the committed spec.

use api_lib::web::interviews::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = "openapi.json";
    let spec = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(path, spec)?;
    println!("wrote OpenAPI document to {path}");
    Ok(())
}
