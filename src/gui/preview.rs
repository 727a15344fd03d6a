use eframe::egui;
use log::warn;

use photo_matting::utils::decode_data_uri;
use photo_matting::ImageRecord;

/// One image pane; keeps a texture for the record it last displayed.
pub struct PreviewPane {
    name: &'static str,
    shown: Option<(String, usize)>,
    texture: Option<egui::TextureHandle>,
}

impl PreviewPane {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            shown: None,
            texture: None,
        }
    }

    /// Re-upload the texture when the record changed since the last frame.
    pub fn sync(&mut self, ctx: &egui::Context, record: &ImageRecord) {
        let key = (record.image_path.clone(), record.image_base64.len());
        if self.shown.as_ref() == Some(&key) {
            return;
        }
        self.shown = Some(key);
        self.texture = None;

        if record.is_empty() {
            return;
        }
        match decode_color_image(&record.image_base64) {
            Ok(color_image) => {
                self.texture = Some(ctx.load_texture(
                    format!("{}-{}", self.name, record.image_path),
                    color_image,
                    egui::TextureOptions::LINEAR,
                ));
            }
            Err(err) => warn!("Cannot preview {}: {}", record.image_path, err),
        }
    }

    pub fn show(&self, ui: &mut egui::Ui, size: egui::Vec2) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_min_size(size);
            ui.set_max_size(size);
            if let Some(texture) = &self.texture {
                ui.centered_and_justified(|ui| {
                    ui.add(egui::Image::new(texture).max_size(size).maintain_aspect_ratio(true));
                });
            }
        });
    }
}

fn decode_color_image(data_uri: &str) -> anyhow::Result<egui::ColorImage> {
    let bytes = decode_data_uri(data_uri)?;
    let rgba = image::load_from_memory(&bytes)?.to_rgba8();
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        [rgba.width() as usize, rgba.height() as usize],
        rgba.as_raw(),
    ))
}
