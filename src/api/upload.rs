use std::path::Path;

use chrono::Utc;
use rand::Rng;
use rocket::{form::Form, fs::TempFile, http::ContentType, serde::json::Json, Route, State};

use crate::{
    config::Config,
    error::{Error, Result},
    model::api::{auth::AdminAuth, upload::UploadedReceipt},
};

pub fn routes() -> Vec<Route> {
    routes![upload_receipt]
}

/// Multipart payload of a receipt upload.
#[derive(FromForm)]
struct ReceiptUpload<'r> {
    file: TempFile<'r>,
}

#[post("/admin/upload", data = "<upload>")]
async fn upload_receipt(
    _auth: AdminAuth,
    mut upload: Form<ReceiptUpload<'_>>,
    config: &State<Config>,
) -> Result<Json<UploadedReceipt>> {
    let extension = receipt_extension(upload.file.content_type())
        .ok_or_else(|| Error::Validation("Receipts must be JPEG, PNG, GIF or PDF".to_string()))?;

    // Timestamp plus a random suffix keeps concurrent uploads from
    // clobbering each other.
    let name = format!(
        "receipt_{}_{:04}.{}",
        Utc::now().timestamp_millis(),
        rand::thread_rng().gen_range(0..10_000),
        extension
    );
    let path = Path::new(config.upload_dir()).join(&name);
    // `copy_to` rather than `persist_to`: the temp dir and the upload dir
    // may be on different filesystems.
    upload.file.copy_to(&path).await?;

    Ok(Json(UploadedReceipt::new(format!(
        "/uploads/receipts/{name}"
    ))))
}

/// The stored file extension for an accepted receipt content type.
fn receipt_extension(content_type: Option<&ContentType>) -> Option<&'static str> {
    let content_type = content_type?;
    if *content_type == ContentType::JPEG {
        Some("jpg")
    } else if *content_type == ContentType::PNG {
        Some("png")
    } else if *content_type == ContentType::GIF {
        Some("gif")
    } else if *content_type == ContentType::PDF {
        Some("pdf")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{Header, Status},
        local::asynchronous::Client,
    };

    use crate::model::api::admin::AdminCredentials;

    use super::*;

    const BOUNDARY: &str = "X-RECEIPT-BOUNDARY";

    #[backend_test(admin)]
    async fn upload_stores_and_serves_receipts(client: Client) {
        let content = "not really a png, but the server does not sniff";
        let response = client
            .post(uri!(upload_receipt))
            .header(AdminCredentials::example1().basic_header())
            .header(multipart_header())
            .body(multipart_body("nota.png", "image/png", content))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let receipt = response.into_json::<UploadedReceipt>().await.unwrap();
        assert!(receipt.url.starts_with("/uploads/receipts/receipt_"));
        assert!(receipt.url.ends_with(".png"));

        // The stored file is served back from the upload mount.
        let response = client.get(receipt.url.clone()).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(response.into_string().await.unwrap(), content);
    }

    #[backend_test(admin)]
    async fn upload_rejects_unsupported_types(client: Client) {
        let response = client
            .post(uri!(upload_receipt))
            .header(AdminCredentials::example1().basic_header())
            .header(multipart_header())
            .body(multipart_body("macro.xlsm", "application/vnd.ms-excel", "ha"))
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        let error = response.into_string().await.unwrap();
        assert!(error.contains("JPEG"));
    }

    #[backend_test]
    async fn upload_requires_credentials(client: Client) {
        let response = client
            .post(uri!(upload_receipt))
            .header(multipart_header())
            .body(multipart_body("nota.jpg", "image/jpeg", "x"))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    fn multipart_header() -> Header<'static> {
        Header::new(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
    }

    fn multipart_body(filename: &str, content_type: &str, content: &str) -> String {
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\
             \r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        )
    }
}
