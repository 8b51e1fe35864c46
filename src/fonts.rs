use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::OnceLock;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::plan::FontVariant;

const MM_PER_PT: f32 = 25.4 / 72.0;

pub(crate) struct EmbeddedFont {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) char_to_gid: Option<HashMap<char, u16>>,
}

impl EmbeddedFont {
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

enum FontData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl AsRef<[u8]> for FontData {
    fn as_ref(&self) -> &[u8] {
        match self {
            FontData::Mapped(m) => m,
            FontData::Owned(v) => v,
        }
    }
}

enum LoadedFont {
    Standard {
        base_font: &'static str,
        widths_1000: Vec<f32>,
    },
    TrueType {
        name: String,
        data: FontData,
        face_index: u32,
        char_widths_1000: HashMap<char, f32>,
        fallback_width_1000: f32,
    },
}

impl LoadedFont {
    fn standard(variant: FontVariant) -> Self {
        LoadedFont::Standard {
            base_font: helvetica_name(variant),
            widths_1000: helvetica_widths(variant.is_bold()),
        }
    }

    fn truetype(name: &str, data: FontData, face_index: u32) -> Option<Self> {
        let face = Face::parse(data.as_ref(), face_index).ok()?;
        let units = face.units_per_em() as f32;
        let advance = |ch: char| {
            face.glyph_index(ch)
                .and_then(|gid| face.glyph_hor_advance(gid))
                .map(|adv| adv as f32 / units * 1000.0)
        };
        let char_widths_1000: HashMap<char, f32> = measured_chars()
            .filter_map(|ch| advance(ch).map(|w| (ch, w)))
            .collect();
        let fallback_width_1000 = advance('?').unwrap_or(500.0);
        Some(LoadedFont::TrueType {
            name: name.to_string(),
            data,
            face_index,
            char_widths_1000,
            fallback_width_1000,
        })
    }

    fn char_width_1000(&self, ch: char) -> f32 {
        match self {
            LoadedFont::Standard { widths_1000, .. } => {
                let byte = char_to_winansi(ch);
                if byte >= 32 {
                    widths_1000[(byte - 32) as usize]
                } else {
                    widths_1000[('?' as u8 - 32) as usize]
                }
            }
            LoadedFont::TrueType {
                char_widths_1000,
                fallback_width_1000,
                ..
            } => char_widths_1000
                .get(&ch)
                .copied()
                .unwrap_or(*fallback_width_1000),
        }
    }
}

/// The four faces a document draws with, plus the metrics used to measure
/// them. Measurement and embedding always read the same face.
pub struct FontSet {
    faces: [LoadedFont; 4],
}

impl FontSet {
    pub fn helvetica() -> Self {
        Self {
            faces: FontVariant::ALL.map(LoadedFont::standard),
        }
    }

    /// Resolve `family` in the font directories. Variants that cannot be found
    /// use the regular face of the family, then Helvetica.
    pub fn load(family: Option<&str>) -> Self {
        let Some(family) = family else {
            return Self::helvetica();
        };
        let regular = find_font_file(family, false, false);
        let faces = FontVariant::ALL.map(|variant| {
            let found = find_font_file(family, variant.is_bold(), variant.is_italic())
                .or_else(|| regular.clone());
            found
                .and_then(|(path, face_index)| {
                    let file = std::fs::File::open(&path).ok()?;
                    let data = unsafe { Mmap::map(&file) }.ok()?;
                    LoadedFont::truetype(family, FontData::Mapped(data), face_index)
                })
                .unwrap_or_else(|| {
                    log::warn!("Font not found: {family} {variant:?}, using Helvetica");
                    LoadedFont::standard(variant)
                })
        });
        Self { faces }
    }

    /// Use in-memory TrueType data for every variant.
    pub fn from_bytes(name: &str, data: Vec<u8>) -> Option<Self> {
        // Parse once up front so a bad file is rejected before it is cloned four times.
        Face::parse(&data, 0).ok()?;
        let mut faces = Vec::with_capacity(4);
        for _ in FontVariant::ALL {
            faces.push(LoadedFont::truetype(name, FontData::Owned(data.clone()), 0)?);
        }
        let faces: [LoadedFont; 4] = faces.try_into().ok()?;
        Some(Self { faces })
    }

    fn face(&self, variant: FontVariant) -> &LoadedFont {
        &self.faces[variant.index()]
    }

    /// Width of `text` in millimetres.
    pub fn text_width(&self, text: &str, variant: FontVariant, size: f32) -> f32 {
        let face = self.face(variant);
        let units: f32 = text.chars().map(|ch| face.char_width_1000(ch)).sum();
        units * size / 1000.0 * MM_PER_PT
    }

    pub(crate) fn embed(
        &self,
        pdf: &mut Pdf,
        variant: FontVariant,
        pdf_name: String,
        alloc: &mut impl FnMut() -> Ref,
        used_chars: &BTreeSet<char>,
    ) -> EmbeddedFont {
        let t0 = std::time::Instant::now();
        let font_ref = alloc();
        let embedded = match self.face(variant) {
            LoadedFont::Standard { base_font, .. } => {
                pdf.type1_font(font_ref)
                    .base_font(Name(base_font.as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
                EmbeddedFont {
                    pdf_name,
                    font_ref,
                    char_to_gid: None,
                }
            }
            LoadedFont::TrueType {
                name,
                data,
                face_index,
                ..
            } => match embed_truetype(pdf, font_ref, name, data.as_ref(), *face_index, used_chars, alloc) {
                Some(char_to_gid) => EmbeddedFont {
                    pdf_name,
                    font_ref,
                    char_to_gid: Some(char_to_gid),
                },
                None => {
                    log::warn!("Embedding {name} failed, writing Helvetica instead");
                    pdf.type1_font(font_ref)
                        .base_font(Name(helvetica_name(variant).as_bytes()))
                        .encoding_predefined(Name(b"WinAnsiEncoding"));
                    EmbeddedFont {
                        pdf_name,
                        font_ref,
                        char_to_gid: None,
                    }
                }
            },
        };
        log::debug!(
            "embed font {variant:?} → {:.1}ms",
            t0.elapsed().as_secs_f64() * 1000.0
        );
        embedded
    }
}

/// Characters whose TrueType advances are cached at load time: Latin,
/// Latin-1, Latin Extended-A and general punctuation.
fn measured_chars() -> impl Iterator<Item = char> {
    (0x20u32..=0x17F)
        .chain(0x2010..=0x2044)
        .chain([0x20AC, 0x2122])
        .filter_map(char::from_u32)
}

/// (lowercase family name, bold, italic) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool, bool), (PathBuf, u32)>;

static FONT_INDEX: OnceLock<FontLookup> = OnceLock::new();

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn read_font_style(data: &[u8], face_index: u32) -> Option<(String, bool, bool)> {
    let face = Face::parse(data, face_index).ok()?;
    let family = font_family_name(&face)?;
    Some((family, face.is_bold(), face.is_italic()))
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(val) = std::env::var("LEGALDOC_FONTS") {
        let sep = if cfg!(windows) { ';' } else { ':' };
        for part in val.split(sep) {
            let trimmed = part.trim();
            if !trimmed.is_empty() {
                dirs.push(PathBuf::from(trimmed));
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
    }

    dirs
}

fn is_font_file(path: &std::path::Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn is_font_collection(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttc"))
}

fn scan_font_dirs() -> FontLookup {
    let t0 = std::time::Instant::now();
    let mut index = FontLookup::new();
    let mut files_scanned = 0u32;
    let mut visited_dirs: std::collections::HashSet<PathBuf> = std::collections::HashSet::new();

    let mut stack: Vec<PathBuf> = font_directories();
    while let Some(dir) = stack.pop() {
        if !visited_dirs.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            files_scanned += 1;
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            let face_count = if is_font_collection(&path) {
                ttf_parser::fonts_in_collection(&data).unwrap_or(1)
            } else {
                1
            };
            for face_idx in 0..face_count {
                if let Some((family, bold, italic)) = read_font_style(&data, face_idx) {
                    index
                        .entry((family.to_lowercase(), bold, italic))
                        .or_insert((path.clone(), face_idx));
                }
            }
        }
    }

    log::info!(
        "Font scan: {:.1}ms, {} files parsed → {} entries",
        t0.elapsed().as_secs_f64() * 1000.0,
        files_scanned,
        index.len(),
    );
    index
}

fn find_font_file(family: &str, bold: bool, italic: bool) -> Option<(PathBuf, u32)> {
    let index = FONT_INDEX.get_or_init(scan_font_dirs);
    index.get(&(family.to_lowercase(), bold, italic)).cloned()
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// WinAnsi bytes for a standard-14 font; unmappable characters become `?`.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match char_to_winansi(c) {
            0 => b'?',
            b => b,
        })
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

fn helvetica_name(variant: FontVariant) -> &'static str {
    match variant {
        FontVariant::Regular => "Helvetica",
        FontVariant::Bold => "Helvetica-Bold",
        FontVariant::Italic => "Helvetica-Oblique",
        FontVariant::BoldItalic => "Helvetica-BoldOblique",
    }
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths(bold: bool) -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| {
            let w = match b {
                32 => 278.0,                          // space
                33..=47 => 333.0,                     // punctuation
                48..=57 => 556.0,                     // digits
                58..=64 => 333.0,                     // more punctuation
                73 | 74 => 278.0,                     // I J (narrow uppercase)
                77 => 833.0,                          // M (wide)
                65..=90 => 667.0,                     // uppercase A-Z (average)
                91..=94 => 333.0,                     // brackets etc.
                95 => 556.0,                          // underscore
                96 => 333.0,
                102 | 105 | 106 | 108 | 116 => 278.0, // narrow lowercase: f i j l t
                109 | 119 => 833.0,                   // m w (wide)
                97..=122 => 556.0,                    // lowercase a-z (average)
                _ => 556.0,
            };
            if bold && b != 32 { w * 1.06 } else { w }
        })
        .collect()
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding,
/// subset to `used_chars`. Returns the char → new glyph id map content streams encode with.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font_name: &str,
    font_data: &[u8],
    face_index: u32,
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<HashMap<char, u16>> {
    let face = Face::parse(font_data, face_index).ok()?;
    let descriptor_ref = alloc();
    let data_ref = alloc();

    let units = face.units_per_em() as f32;
    let scale = |v: f32| v / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| scale(h as f32))
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        scale(bb.x_min as f32),
        scale(bb.y_min as f32),
        scale(bb.x_max as f32),
        scale(bb.y_max as f32),
    );

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    for &ch in used_chars {
        if let Some(gid) = face.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            char_to_gid.insert(ch, new_gid);
            let w = face
                .glyph_hor_advance(gid)
                .map(|adv| scale(adv as f32))
                .unwrap_or(0.0);
            gid_widths.push((new_gid, w));
        }
    }
    gid_widths.sort_by_key(|&(gid, _)| gid);
    gid_widths.dedup_by_key(|&mut (gid, _)| gid);

    let subset_data = subsetter::subset(font_data, face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {font_name}: {e}, embedding full font");
        font_data.to_vec()
    });

    let data_len = i32::try_from(subset_data.len()).ok()?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = font_name.replace(' ', "");

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(if face.is_italic() { -12.0 } else { 0.0 })
        .ascent(scale(face.ascender() as f32))
        .descent(scale(face.descender() as f32))
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let system_info = || pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };

    let cid_font_ref = alloc();
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), system_info());
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Some(char_to_gid)
}
