//! Upload-then-reference flow for products, gift boxes and categories.
//!
//! The image picker keeps a mix of URLs already stored on the server and
//! local files chosen in this session. Before the resource body is sent every
//! local file is uploaded, in order, and replaced by the URL the server
//! returned. Stored URLs pass through untouched.
use leptos::logging::{log, warn};

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::models::{check, Validate};
use crate::session::SessionStore;

#[derive(Debug, Clone, PartialEq)]
pub enum ImageRef<F = web_sys::File> {
    /// Already persisted; `src` is the server URL.
    Stored(String),
    /// Chosen locally; `preview` is a `blob:` URL for the thumbnail.
    Pending { file: F, preview: String },
}

impl<F> ImageRef<F> {
    /// What an `<img src>` should show for this entry.
    pub fn src(&self) -> &str {
        match self {
            ImageRef::Stored(url) => url,
            ImageRef::Pending { preview, .. } => preview,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ImageRef::Pending { .. })
    }
}

/// Wraps persisted URLs for the picker.
pub fn stored<F>(urls: &[String]) -> Vec<ImageRef<F>> {
    urls.iter().cloned().map(ImageRef::Stored).collect()
}

#[allow(async_fn_in_trait)]
pub trait ImageUploader {
    type File;

    /// Uploads one file and returns the URL to reference it by.
    async fn upload_file(&self, file: &Self::File) -> Result<String, ClientError>;
}

impl<S: SessionStore + Clone> ImageUploader for ApiClient<S> {
    type File = web_sys::File;

    async fn upload_file(&self, file: &web_sys::File) -> Result<String, ClientError> {
        self.upload(file).await.map(|uploaded| uploaded.url)
    }
}

/// Uploads pending files one after another and returns the final URL list.
///
/// The first failure aborts the whole operation; nothing is retried.
pub async fn resolve_images<U: ImageUploader>(
    uploader: &U,
    images: &[ImageRef<U::File>],
) -> Result<Vec<String>, ClientError> {
    let mut urls = Vec::with_capacity(images.len());
    for (position, image) in images.iter().enumerate() {
        match image {
            ImageRef::Stored(url) => urls.push(url.clone()),
            ImageRef::Pending { file, .. } => {
                let url = uploader.upload_file(file).await.map_err(|err| {
                    warn!("[UPLOAD] Image {} failed: {}", position + 1, err);
                    err
                })?;
                log!("[UPLOAD] Image {} stored at {}", position + 1, url);
                urls.push(url);
            }
        }
    }
    Ok(urls)
}

/// Checks `draft` first and only then uploads its pending images, so a form
/// that will be rejected leaves no orphaned files on the server.
pub async fn upload_for_draft<T: Validate, U: ImageUploader>(
    uploader: &U,
    draft: &T,
    images: &[ImageRef<U::File>],
) -> Result<Vec<String>, ClientError> {
    check(draft).map_err(ClientError::Validation)?;
    resolve_images(uploader, images).await
}

/// Creates a `blob:` URL so a chosen file can be previewed before upload.
pub fn preview_url(file: &web_sys::File) -> Option<String> {
    web_sys::Url::create_object_url_with_blob(file).ok()
}

/// Frees the preview of a pending image the user removed or that was uploaded.
pub fn release_preview<F>(image: &ImageRef<F>) {
    if let ImageRef::Pending { preview, .. } = image {
        let _ = web_sys::Url::revoke_object_url(preview);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::RefCell;

    /// Records which files were sent and fails on a chosen name.
    #[derive(Default)]
    struct FakeUploader {
        sent: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl ImageUploader for FakeUploader {
        type File = &'static str;

        async fn upload_file(&self, file: &&'static str) -> Result<String, ClientError> {
            if self.fail_on == Some(*file) {
                return Err(ClientError::Http {
                    status: 413,
                    message: "File too large".into(),
                });
            }
            self.sent.borrow_mut().push(file.to_string());
            Ok(format!("/uploads/{file}"))
        }
    }

    fn pending(name: &'static str) -> ImageRef<&'static str> {
        ImageRef::Pending {
            file: name,
            preview: format!("blob:{name}"),
        }
    }

    #[test]
    fn stored_urls_pass_through_and_order_is_kept() {
        let uploader = FakeUploader::default();
        let images = vec![
            ImageRef::Stored("/uploads/old.png".to_string()),
            pending("new-a.png"),
            ImageRef::Stored("https://cdn.test/b.jpg".to_string()),
            pending("new-b.png"),
        ];

        let urls = block_on(resolve_images(&uploader, &images)).unwrap();

        assert_eq!(
            urls,
            vec![
                "/uploads/old.png",
                "/uploads/new-a.png",
                "https://cdn.test/b.jpg",
                "/uploads/new-b.png",
            ]
        );
        assert_eq!(*uploader.sent.borrow(), vec!["new-a.png", "new-b.png"]);
    }

    #[test]
    fn nothing_pending_means_no_uploads() {
        let uploader = FakeUploader::default();
        let images: Vec<ImageRef<&'static str>> = stored(&["/uploads/a.png".to_string()]);
        let urls = block_on(resolve_images(&uploader, &images)).unwrap();
        assert_eq!(urls, vec!["/uploads/a.png"]);
        assert!(uploader.sent.borrow().is_empty());
    }

    #[test]
    fn first_failure_stops_the_sequence() {
        let uploader = FakeUploader {
            fail_on: Some("huge.png"),
            ..Default::default()
        };
        let images = vec![pending("a.png"), pending("huge.png"), pending("c.png")];
        let err = block_on(resolve_images(&uploader, &images)).unwrap_err();
        assert_eq!(err.to_string(), "File too large");
        assert_eq!(*uploader.sent.borrow(), vec!["a.png"]);
    }

    #[test]
    fn invalid_draft_uploads_nothing() {
        use crate::models::product::ProductInput;

        let uploader = FakeUploader::default();
        let images = vec![pending("a.png"), pending("b.png")];
        let mut draft = ProductInput {
            name: " ".into(),
            price: -4.0,
            ..Default::default()
        };

        let err = block_on(upload_for_draft(&uploader, &draft, &images)).unwrap_err();
        assert_eq!(
            err,
            ClientError::Validation(vec![
                "Name is required".into(),
                "Price must not be negative".into()
            ])
        );
        assert!(uploader.sent.borrow().is_empty());

        draft.name = "Sumac".into();
        draft.price = 4.0;
        let urls = block_on(upload_for_draft(&uploader, &draft, &images)).unwrap();
        assert_eq!(urls, vec!["/uploads/a.png", "/uploads/b.png"]);
    }

    #[test]
    fn src_prefers_preview_for_pending() {
        assert_eq!(pending("x.png").src(), "blob:x.png");
        assert!(pending("x.png").is_pending());
    }
}
