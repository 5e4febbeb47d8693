//! Social media output presets.
//!
//! A static, read-only name → dimensions table. Names are unique and matched
//! case-insensitively.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SocialMediaPreset {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

const fn preset(name: &'static str, width: u32, height: u32) -> SocialMediaPreset {
    SocialMediaPreset {
        name,
        width,
        height,
    }
}

pub static SOCIAL_MEDIA_PRESETS: &[SocialMediaPreset] = &[
    preset("Instagram Post", 1080, 1080),
    preset("Instagram Portrait", 1080, 1350),
    preset("Instagram Story", 1080, 1920),
    preset("Facebook Post", 1200, 630),
    preset("Facebook Cover", 820, 312),
    preset("Twitter Post", 1600, 900),
    preset("Twitter Header", 1500, 500),
    preset("LinkedIn Post", 1200, 627),
    preset("LinkedIn Banner", 1584, 396),
    preset("YouTube Thumbnail", 1280, 720),
    preset("Pinterest Pin", 1000, 1500),
];

pub fn find_preset(name: &str) -> Option<&'static SocialMediaPreset> {
    let name = name.trim();
    SOCIAL_MEDIA_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}
