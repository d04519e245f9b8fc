/// Thumbnail list with a file chooser; new files stay local until the form is saved.
use leptos::logging::warn;
use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlInputElement;

use crate::upload::{preview_url, release_preview, ImageRef};

#[component]
pub fn ImagePicker(
    images: RwSignal<Vec<ImageRef>>,
    /// Single-image resources replace the current image instead of appending.
    #[prop(default = true)]
    multiple: bool,
) -> impl IntoView {
    let on_change = move |ev: ev::Event| {
        let Some(input) = ev
            .target()
            .and_then(|target| target.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        let Some(files) = input.files() else {
            return;
        };

        let mut chosen = Vec::new();
        for index in 0..files.length() {
            let Some(file) = files.get(index) else {
                continue;
            };
            match preview_url(&file) {
                Some(preview) => chosen.push(ImageRef::Pending { file, preview }),
                None => warn!("[UPLOAD] No preview for {}", file.name()),
            }
        }

        images.update(|current| {
            if !multiple {
                current.iter().for_each(release_preview);
                current.clear();
                chosen.truncate(1);
            }
            current.extend(chosen);
        });
        // Allow choosing the same file again after removing it.
        input.set_value("");
    };

    let remove = move |index: usize| {
        images.update(|current| {
            if index < current.len() {
                let removed = current.remove(index);
                release_preview(&removed);
            }
        });
    };

    view! {
        <div class="image-picker">
            <div class="thumbnails">
                {move || {
                    images
                        .get()
                        .into_iter()
                        .enumerate()
                        .map(|(index, image)| {
                            let class = if image.is_pending() { "thumb pending" } else { "thumb" };
                            view! {
                                <div class=class>
                                    <img src=image.src().to_string() alt="" />
                                    <button type="button" class="remove" on:click=move |_| remove(index)>
                                        "×"
                                    </button>
                                </div>
                            }
                        })
                        .collect_view()
                }}
            </div>
            <input type="file" accept="image/*" multiple=multiple on:change=on_change />
        </div>
    }
}
