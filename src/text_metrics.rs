//! Label widths from real font metrics.
//!
//! Fonts are resolved once per family through the system font database and
//! their horizontal advances cached. Without the `font-metrics` feature every
//! query returns `None` and callers fall back to calibrated character widths.

#[cfg(feature = "font-metrics")]
mod system {
    use fontdb::{Database, Family, Query, Stretch, Style, Weight};
    use once_cell::sync::Lazy;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use ttf_parser::Face;

    static MEASURER: Lazy<Mutex<FontMeasurer>> = Lazy::new(|| Mutex::new(FontMeasurer::new()));

    pub fn measure(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let mut guard = MEASURER.lock().ok()?;
        guard.measure(text, font_size, font_family)
    }

    struct FontMeasurer {
        db: Database,
        loaded_system_fonts: bool,
        faces: HashMap<String, Option<FaceMetrics>>,
    }

    struct FaceMetrics {
        data: Vec<u8>,
        index: u32,
        units_per_em: f32,
        ascii_advances: [u16; 128],
        advances: HashMap<char, Option<u16>>,
    }

    impl FaceMetrics {
        fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
            let (units_per_em, ascii_advances) = {
                let face = Face::parse(&data, index).ok()?;
                let mut advances = [0u16; 128];
                for byte in 0u8..=127 {
                    if let Some(glyph) = face.glyph_index(byte as char) {
                        advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
                    }
                }
                (face.units_per_em().max(1) as f32, advances)
            };
            Some(Self {
                data,
                index,
                units_per_em,
                ascii_advances,
                advances: HashMap::new(),
            })
        }

        fn advance(&mut self, ch: char) -> Option<u16> {
            if ch.is_ascii() {
                let advance = self.ascii_advances[ch as usize];
                return (advance > 0).then_some(advance);
            }
            if let Some(cached) = self.advances.get(&ch) {
                return *cached;
            }
            let advance = Face::parse(&self.data, self.index).ok().and_then(|face| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
            });
            self.advances.insert(ch, advance);
            advance
        }

        fn width(&mut self, text: &str, font_size: f32) -> f32 {
            let scale = font_size / self.units_per_em;
            let fallback = font_size * 0.56;
            text.chars()
                .filter(|ch| *ch != '\n')
                .map(|ch| match self.advance(ch) {
                    Some(advance) => advance as f32 * scale,
                    None => fallback,
                })
                .sum()
        }
    }

    impl FontMeasurer {
        fn new() -> Self {
            Self {
                db: Database::new(),
                loaded_system_fonts: false,
                faces: HashMap::new(),
            }
        }

        fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
            let key = font_family.trim().to_string();
            if !self.faces.contains_key(&key) {
                let face = self.load(font_family);
                self.faces.insert(key.clone(), face);
            }
            let face = self.faces.get_mut(&key)?.as_mut()?;
            Some(face.width(&text.replace('\t', "    "), font_size))
        }

        fn load(&mut self, font_family: &str) -> Option<FaceMetrics> {
            let names: Vec<String> = font_family
                .split(',')
                .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
                .filter(|name| !name.is_empty())
                .collect();
            let mut families: Vec<Family<'_>> = names
                .iter()
                .map(|name| match name.to_ascii_lowercase().as_str() {
                    "serif" => Family::Serif,
                    "monospace" | "ui-monospace" => Family::Monospace,
                    "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => {
                        Family::SansSerif
                    }
                    _ => Family::Name(name.as_str()),
                })
                .collect();
            if families.is_empty() {
                families.push(Family::SansSerif);
            }

            if !self.loaded_system_fonts {
                self.db.load_system_fonts();
                self.loaded_system_fonts = true;
            }

            let query = Query {
                families: &families,
                weight: Weight::NORMAL,
                stretch: Stretch::Normal,
                style: Style::Normal,
            };
            let id = self.db.query(&query)?;
            self.db
                .with_face_data(id, |data, index| FaceMetrics::parse(data.to_vec(), index))
                .flatten()
        }
    }
}

pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    #[cfg(feature = "font-metrics")]
    {
        system::measure(text, font_size, font_family)
    }
    #[cfg(not(feature = "font-metrics"))]
    {
        let _ = font_family;
        None
    }
}
