use eframe::egui;
use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use log::{info, warn};

// Families with Simplified Chinese coverage, most common first per platform
const CJK_FAMILIES: &[&str] = &[
    "Microsoft YaHei",
    "PingFang SC",
    "Hiragino Sans GB",
    "Noto Sans CJK SC",
    "Noto Sans SC",
    "Source Han Sans SC",
    "WenQuanYi Micro Hei",
    "Droid Sans Fallback",
    "SimSun",
];

/// Face to use inside a font collection (`.ttc`); 0 for single-face files.
fn face_index(handle: &Handle) -> u32 {
    match handle {
        Handle::Path { font_index, .. } | Handle::Memory { font_index, .. } => *font_index,
    }
}

fn find_cjk_font() -> Option<(String, Vec<u8>, u32)> {
    let families: Vec<FamilyName> = CJK_FAMILIES
        .iter()
        .map(|name| FamilyName::Title(name.to_string()))
        .collect();

    let handle = SystemSource::new()
        .select_best_match(&families, &Properties::new())
        .ok()?;
    let index = face_index(&handle);
    let font = handle.load().ok()?;
    let data = font.copy_font_data()?;
    Some((font.family_name(), (*data).clone(), index))
}

/// Register a system CJK font as fallback so the Chinese labels render.
pub fn install_cjk_fallback(ctx: &egui::Context) {
    let Some((name, data, index)) = find_cjk_font() else {
        warn!("No CJK system font found, Chinese text will not render");
        return;
    };

    let mut font_data = egui::FontData::from_owned(data);
    font_data.index = index;

    let mut fonts = egui::FontDefinitions::default();
    fonts.font_data.insert(name.clone(), font_data.into());
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts.families.entry(family).or_default().push(name.clone());
    }
    ctx.set_fonts(fonts);
    info!("Using {} (face {}) for CJK text", name, index);
}
