use crate::assets::ImageStore;
use crate::canvas::{Command, Document, Page};
use crate::error::{CatalogError, Result};
use crate::font::BaseFont;
use crate::metrics::DocumentMetrics;
use crate::types::{Color, Pt, Size};
use image::GenericImageView;
use std::collections::HashMap;
use std::io::{self, Write};

#[derive(Debug, Clone)]
pub struct PdfOptions {
    pub title: Option<String>,
    /// Flate-compress page content streams.
    pub compress: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            title: None,
            compress: true,
        }
    }
}

const FONTS: [BaseFont; 2] = [BaseFont::Helvetica, BaseFont::HelveticaBold];

pub fn document_to_pdf(document: &Document, images: &ImageStore) -> Result<Vec<u8>> {
    document_to_pdf_with_metrics(document, images, None, &PdfOptions::default())
}

pub fn document_to_pdf_with_metrics(
    document: &Document,
    images: &ImageStore,
    metrics: Option<&mut DocumentMetrics>,
    options: &PdfOptions,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    document_to_writer(document, images, metrics, options, &mut out)?;
    Ok(out)
}

/// Serializes `document` into `writer` and returns the number of bytes written.
pub fn document_to_writer<W: Write>(
    document: &Document,
    images: &ImageStore,
    mut metrics: Option<&mut DocumentMetrics>,
    options: &PdfOptions,
    writer: &mut W,
) -> Result<usize> {
    let image_objects = prepare_images(document, images)?;

    // Object ids: catalog, page tree, fonts, images (+ soft masks), then a
    // page/content pair per page and the info dictionary last.
    let catalog_id = 1;
    let pages_id = 2;
    let font_base_id = 3;
    let mut next_id = font_base_id + FONTS.len();
    let mut image_ids: Vec<(usize, Option<usize>)> = Vec::with_capacity(image_objects.len());
    for image in &image_objects {
        let id = next_id;
        next_id += 1;
        let smask = image.data.alpha.as_ref().map(|_| {
            let smask_id = next_id;
            next_id += 1;
            smask_id
        });
        image_ids.push((id, smask));
    }
    let page_base_id = next_id;
    let info_id = page_base_id + document.pages.len() * 2;
    let object_count = info_id;

    let mut pdf = PdfStreamWriter::new(writer, object_count);
    pdf.write_header()?;

    pdf.write_object(
        catalog_id,
        format!("<< /Type /Catalog /Pages {pages_id} 0 R >>").as_bytes(),
    )?;
    let kids: Vec<String> = (0..document.pages.len())
        .map(|idx| format!("{} 0 R", page_base_id + idx * 2))
        .collect();
    pdf.write_object(
        pages_id,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            document.pages.len()
        )
        .as_bytes(),
    )?;

    for (offset, font) in FONTS.iter().enumerate() {
        pdf.write_object(font_base_id + offset, font_object(*font).as_bytes())?;
    }

    let mut image_names: HashMap<&str, String> = HashMap::new();
    let mut xobject_entries = Vec::new();
    for (index, (image, (id, smask_id))) in image_objects.iter().zip(&image_ids).enumerate() {
        let name = format!("Im{}", index + 1);
        if let (Some(alpha), Some(smask_id)) = (&image.data.alpha, smask_id) {
            pdf.write_stream(*smask_id, &image_smask_dict(alpha), &alpha.data)?;
        }
        pdf.write_stream(*id, &image_dict(&image.data, *smask_id), &image.data.data)?;
        xobject_entries.push(format!("/{name} {id} 0 R"));
        image_names.insert(image.resource_id.as_str(), name);
    }

    let font_entries: Vec<String> = FONTS
        .iter()
        .enumerate()
        .map(|(offset, font)| format!("/{} {} 0 R", font.resource_name(), font_base_id + offset))
        .collect();
    let mut resources = format!("<< /Font << {} >>", font_entries.join(" "));
    if !xobject_entries.is_empty() {
        resources.push_str(&format!(" /XObject << {} >>", xobject_entries.join(" ")));
    }
    resources.push_str(" >>");

    let mut page_content_bytes = Vec::with_capacity(document.pages.len());
    for (idx, page) in document.pages.iter().enumerate() {
        let page_id = page_base_id + idx * 2;
        let content_id = page_id + 1;
        pdf.write_object(
            page_id,
            format!(
                "<< /Type /Page /Parent {pages_id} 0 R /MediaBox [0 0 {} {}] /Resources {resources} /Contents {content_id} 0 R >>",
                fmt_pt(document.page_size.width),
                fmt_pt(document.page_size.height),
            )
            .as_bytes(),
        )?;

        let content = render_page(page, document.page_size, &image_names);
        page_content_bytes.push(content.len());
        if options.compress {
            let compressed = flate_compress(content.as_bytes());
            pdf.write_stream(content_id, "/Filter /FlateDecode", &compressed)?;
        } else {
            pdf.write_stream(content_id, "", content.as_bytes())?;
        }
    }

    pdf.write_object(info_id, info_object(options.title.as_deref()).as_bytes())?;
    let total_bytes = pdf.finish(catalog_id, info_id)?;

    if let Some(metrics) = metrics.as_deref_mut() {
        metrics.total_bytes = total_bytes;
        for (page_index, content_bytes) in page_content_bytes.iter().enumerate() {
            metrics.page_mut(page_index + 1).content_bytes = *content_bytes;
        }
    }

    tracing::debug!(
        pages = document.pages.len(),
        images = image_objects.len(),
        bytes = total_bytes,
        "pdf written"
    );
    Ok(total_bytes)
}

struct PdfStreamWriter<'a, W: Write> {
    writer: &'a mut W,
    offset: usize,
    offsets: Vec<usize>,
}

impl<'a, W: Write> PdfStreamWriter<'a, W> {
    fn new(writer: &'a mut W, object_count: usize) -> Self {
        Self {
            writer,
            offset: 0,
            offsets: vec![0; object_count + 1],
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.offset += data.len();
        Ok(())
    }

    fn write_header(&mut self) -> io::Result<()> {
        self.write_bytes(b"%PDF-1.4\n")?;
        self.write_bytes(b"%\xE2\xE3\xCF\xD3\n")
    }

    fn write_object(&mut self, obj_id: usize, body: &[u8]) -> io::Result<()> {
        if let Some(slot) = self.offsets.get_mut(obj_id) {
            *slot = self.offset;
        }
        self.write_bytes(format!("{obj_id} 0 obj\n").as_bytes())?;
        self.write_bytes(body)?;
        self.write_bytes(b"\nendobj\n")
    }

    fn write_stream(&mut self, obj_id: usize, dict_entries: &str, data: &[u8]) -> io::Result<()> {
        let mut body = Vec::with_capacity(data.len() + 64);
        let head = if dict_entries.is_empty() {
            format!("<< /Length {} >>\nstream\n", data.len())
        } else {
            format!("<< /Length {} {dict_entries} >>\nstream\n", data.len())
        };
        body.extend_from_slice(head.as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.write_object(obj_id, &body)
    }

    fn finish(mut self, catalog_id: usize, info_id: usize) -> io::Result<usize> {
        let xref_start = self.offset;
        let size = self.offsets.len();
        let mut xref = format!("xref\n0 {size}\n0000000000 65535 f \n");
        for offset in self.offsets.iter().skip(1) {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {size} /Root {catalog_id} 0 R /Info {info_id} 0 R >>\nstartxref\n{xref_start}\n%%EOF\n"
        ));
        self.write_bytes(xref.as_bytes())?;
        self.writer.flush()?;
        Ok(self.offset)
    }
}

struct PreparedImage {
    resource_id: String,
    data: ImageData,
}

struct ImageData {
    width: u32,
    height: u32,
    color_space: &'static str,
    filter: &'static str,
    data: Vec<u8>,
    alpha: Option<AlphaData>,
}

struct AlphaData {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Decodes every image the document references, in first-use order.
fn prepare_images(document: &Document, images: &ImageStore) -> Result<Vec<PreparedImage>> {
    let mut seen = std::collections::HashSet::new();
    let mut prepared = Vec::new();
    for resource_id in document.image_resources() {
        if !seen.insert(resource_id) {
            continue;
        }
        let asset = images
            .get(resource_id)
            .ok_or_else(|| CatalogError::asset(format!("image resource '{resource_id}' is not loaded")))?;
        let data = decode_image_bytes(&asset.data).map_err(|message| CatalogError::ImageDecode {
            resource_id: resource_id.to_string(),
            message,
        })?;
        prepared.push(PreparedImage {
            resource_id: resource_id.to_string(),
            data,
        });
    }
    Ok(prepared)
}

fn decode_image_bytes(data: &[u8]) -> std::result::Result<ImageData, String> {
    let format = image::guess_format(data).map_err(|err| err.to_string())?;
    let decoded = image::load_from_memory_with_format(data, format).map_err(|err| err.to_string())?;
    let (width, height) = decoded.dimensions();

    if format == image::ImageFormat::Jpeg {
        let color_space = match decoded.color() {
            image::ColorType::L8 | image::ColorType::La8 => "/DeviceGray",
            _ => "/DeviceRGB",
        };
        return Ok(ImageData {
            width,
            height,
            color_space,
            filter: "/DCTDecode",
            data: data.to_vec(),
            alpha: None,
        });
    }

    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    let mut has_alpha = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if a != 255 {
            has_alpha = true;
        }
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let alpha = has_alpha.then(|| AlphaData {
        width,
        height,
        data: flate_compress(&alpha),
    });
    Ok(ImageData {
        width,
        height,
        color_space: "/DeviceRGB",
        filter: "/FlateDecode",
        data: flate_compress(&rgb),
        alpha,
    })
}

fn flate_compress(data: &[u8]) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

fn image_dict(image: &ImageData, smask_id: Option<usize>) -> String {
    let smask = smask_id
        .map(|id| format!(" /SMask {id} 0 R"))
        .unwrap_or_default();
    format!(
        "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent 8 /Filter {}{}",
        image.width, image.height, image.color_space, image.filter, smask
    )
}

fn image_smask_dict(alpha: &AlphaData) -> String {
    format!(
        "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode",
        alpha.width, alpha.height
    )
}

fn font_object(font: BaseFont) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        font.postscript_name()
    )
}

fn info_object(title: Option<&str>) -> String {
    let mut entries = vec!["/Producer (vitrine)".to_string()];
    if let Some(title) = title {
        entries.push(format!("/Title ({})", encode_winansi_pdf_string(title).text));
    }
    format!("<< {} >>", entries.join(" "))
}

#[derive(Clone, Copy)]
struct TextState {
    font: BaseFont,
    font_size: Pt,
}

fn render_page(page: &Page, page_size: Size, image_names: &HashMap<&str, String>) -> String {
    let page_height = page_size.height;
    let mut out = String::new();
    let mut state = TextState {
        font: BaseFont::Helvetica,
        font_size: Pt::from_i32(12),
    };
    let mut stack: Vec<TextState> = Vec::new();

    for cmd in &page.commands {
        match cmd {
            Command::SaveState => {
                stack.push(state);
                out.push_str("q\n");
            }
            Command::RestoreState => {
                if let Some(saved) = stack.pop() {
                    state = saved;
                }
                out.push_str("Q\n");
            }
            Command::Meta { .. } => {}
            Command::SetFillColor(color) => {
                out.push_str(&format!("{} rg\n", color_components(*color)));
            }
            Command::SetStrokeColor(color) => {
                out.push_str(&format!("{} RG\n", color_components(*color)));
            }
            Command::SetLineWidth(width) => {
                out.push_str(&format!("{} w\n", fmt_pt(*width)));
            }
            Command::SetFont(font) => state.font = *font,
            Command::SetFontSize(size) => state.font_size = *size,
            Command::DrawString { x, y, text } => {
                let encoded = encode_winansi_pdf_string(text);
                if encoded.replaced > 0 {
                    tracing::warn!(
                        replaced = encoded.replaced,
                        text = %text,
                        "characters outside WinAnsi were replaced"
                    );
                }
                let baseline = page_height - *y - state.font_size;
                out.push_str(&format!(
                    "BT /{} {} Tf {} {} Td ({}) Tj ET\n",
                    state.font.resource_name(),
                    fmt_pt(state.font_size),
                    fmt_pt(*x),
                    fmt_pt(baseline),
                    encoded.text
                ));
            }
            Command::FillRect {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re f\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::StrokeRect {
                x,
                y,
                width,
                height,
            } => {
                out.push_str(&format!(
                    "{} {} {} {} re S\n",
                    fmt_pt(*x),
                    fmt_pt(page_height - *y - *height),
                    fmt_pt(*width),
                    fmt_pt(*height)
                ));
            }
            Command::DrawImage {
                x,
                y,
                width,
                height,
                resource_id,
            } => {
                // Resources are validated in `prepare_images`.
                if let Some(name) = image_names.get(resource_id.as_str()) {
                    out.push_str(&format!(
                        "q {} 0 0 {} {} {} cm /{} Do Q\n",
                        fmt_pt(*width),
                        fmt_pt(*height),
                        fmt_pt(*x),
                        fmt_pt(page_height - *y - *height),
                        name
                    ));
                }
            }
        }
    }
    out
}

fn color_components(color: Color) -> String {
    format!(
        "{} {} {}",
        fmt(clamp_unit(color.r)),
        fmt(clamp_unit(color.g)),
        fmt(clamp_unit(color.b))
    )
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

fn fmt(value: f32) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    fmt_pt(Pt::from_f32(value))
}

fn fmt_pt(value: Pt) -> String {
    format_milli(value.to_milli())
}

fn format_milli(milli: i64) -> String {
    if milli == 0 {
        return "0".to_string();
    }
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.abs();
    let int_part = abs / 1000;
    let frac_part = abs % 1000;
    if frac_part == 0 {
        return format!("{sign}{int_part}");
    }
    let mut s = format!("{sign}{int_part}.{frac_part:03}");
    while s.ends_with('0') {
        s.pop();
    }
    s
}

struct WinAnsiEncoded {
    text: String,
    replaced: usize,
}

fn encode_winansi_pdf_string(input: &str) -> WinAnsiEncoded {
    let mut out = String::new();
    let mut replaced = 0usize;
    for ch in input.chars() {
        let byte = match ch {
            '\u{0000}'..='\u{007F}' => ch as u8,
            '\u{00A0}'..='\u{00FF}' => ch as u8,
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            _ => {
                replaced += 1;
                b'?'
            }
        };

        match byte {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if b < 0x20 || b >= 0x7f => out.push_str(&format!("\\{b:03o}")),
            b => out.push(b as char),
        }
    }
    WinAnsiEncoded { text: out, replaced }
}
