use crate::error::UploadError;
use askama::Template;
use axum::response::Html;

#[derive(Template)]
#[template(path = "index.html")]
pub struct UploadForm {
    pub max_upload_mib: u64,
}

#[derive(Template)]
#[template(path = "upload_succeeded.html")]
pub struct UploadSucceeded<'a> {
    pub file_name: &'a str,
    pub file_id: &'a str,
}

#[derive(Template)]
#[template(path = "upload_failed.html")]
pub struct UploadFailed<'a> {
    pub message: &'a str,
}

pub fn render<T: Template>(template: &T) -> Result<Html<String>, UploadError> {
    Ok(Html(template.render()?))
}
