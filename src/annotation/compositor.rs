//! Renders an [`AnnotationSpec`] onto the selected pages of a document.
//!
//! Each selected page receives a `/Watermark` annotation whose normal
//! appearance is a form XObject drawing the text in Helvetica. The form
//! carries its own font and graphics-state resources, so page resources are
//! never touched. The form's `/BBox` equals the annotation `/Rect` and its
//! matrix is the identity, which makes the appearance draw in page space.

use super::{AnnotationSpec, Color};
use crate::document::{Document, Rect};
use crate::error::{Error, ParseError, Result};
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat, dictionary};

/// Distance kept from the page edge for named positions, in points.
pub const MARGIN: f64 = 36.0;

/// Helvetica ascender and descender, in thousandths of an em.
const ASCENT: f64 = 718.0;
const DESCENT: f64 = 207.0;

/// Padding around the rotated text when computing the annotation rectangle.
const RECT_PADDING: f64 = 1.0;

/// Annotation flags: Print (bit 3) and ReadOnly (bit 7).
const ANNOTATION_FLAGS: i64 = 4 | 64;

/// Helvetica advance widths for WinAnsi codes 32..=126.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const DEFAULT_GLYPH_WIDTH: u16 = 556;

/// Where and how large the text ends up on one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Baseline origin of the unrotated text.
    pub x: f64,
    pub y: f64,
    pub text_width: f64,
    /// Bounding box of the rotated text, used as the annotation rectangle.
    pub rect: Rect,
}

/// Apply `spec` to `doc`, returning a new document.
///
/// The input document is left untouched. The output has the same number of
/// pages. Fails with [`AnnotationError::NoValidPages`](crate::error::AnnotationError::NoValidPages)
/// when the page selection resolves to nothing.
pub fn apply_annotation(doc: &Document, spec: &AnnotationSpec) -> Result<Document> {
    let color = spec.validate()?;
    let targets = spec.pages.resolve_non_empty(doc.page_count())?;

    log::debug!(
        "annotating {} of {} pages with {:?}",
        targets.len(),
        doc.page_count(),
        spec.text
    );

    let mut inner = doc.lopdf().clone();
    let font_id = inner.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    for number in targets {
        let Some(page) = doc.page(number) else {
            continue;
        };
        let placement = compute_placement(spec, page.media_box());
        let appearance = build_appearance_stream(spec, color, &placement);
        let form_id = inner.add_object(Stream::new(
            form_dictionary(spec, &placement, font_id),
            appearance,
        ));

        let annot = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Watermark",
            "Rect" => rect_array(&placement.rect),
            "P" => page.object_id(),
            "F" => ANNOTATION_FLAGS,
            "NM" => Object::string_literal(format!("pdfseal-watermark-p{number}-{}", form_id.0)),
            "Contents" => Object::String(encode_text(&spec.text), StringFormat::Literal),
            "AP" => dictionary! { "N" => form_id },
        };
        let annot_id = inner.add_object(annot);
        attach_to_page(&mut inner, page.object_id(), annot_id)?;
    }

    let mut output = Vec::new();
    inner
        .save_to(&mut output)
        .map_err(|e| Error::Serialization(format!("failed to write annotated PDF: {e}")))?;

    let annotated = Document::load(output)?;
    if annotated.page_count() != doc.page_count() {
        return Err(ParseError::Corrupt(format!(
            "annotated document has {} pages, expected {}",
            annotated.page_count(),
            doc.page_count()
        ))
        .into());
    }
    Ok(annotated)
}

/// Estimated width of `text` set in Helvetica at `font_size`.
pub fn text_width(text: &str, font_size: f64) -> f64 {
    let units: u32 = text
        .chars()
        .map(|c| {
            let code = c as u32;
            if (32..=126).contains(&code) {
                u32::from(HELVETICA_WIDTHS[(code - 32) as usize])
            } else {
                u32::from(DEFAULT_GLYPH_WIDTH)
            }
        })
        .sum();
    f64::from(units) * font_size / 1000.0
}

/// Resolve the baseline origin and rotated bounds of the text on a page.
pub fn compute_placement(spec: &AnnotationSpec, media_box: Rect) -> Placement {
    let width = text_width(&spec.text, spec.font_size);
    let ascent = ASCENT * spec.font_size / 1000.0;
    let descent = DESCENT * spec.font_size / 1000.0;

    let (x, y) = spec.coordinates().unwrap_or_else(|| {
        use super::Position::*;
        let left = media_box.llx + MARGIN;
        let right = media_box.urx - MARGIN - width;
        let top = media_box.ury - MARGIN - ascent;
        let bottom = media_box.lly + MARGIN + descent;
        match spec.position {
            TopLeft => (left, top),
            TopRight => (right, top),
            BottomLeft => (left, bottom),
            BottomRight => (right, bottom),
            Center => (
                media_box.llx + (media_box.width() - width) / 2.0,
                media_box.lly + (media_box.height() - (ascent - descent)) / 2.0,
            ),
        }
    });

    let (cx, cy) = rotation_centre(x, y, width, ascent, descent);
    let half_w = width / 2.0;
    let half_h = (ascent + descent) / 2.0;
    let (sin, cos) = spec.rotation.to_radians().sin_cos();

    let corners = [(-half_w, -half_h), (half_w, -half_h), (half_w, half_h), (-half_w, half_h)]
        .map(|(dx, dy)| (cx + dx * cos - dy * sin, cy + dx * sin + dy * cos));
    let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);

    Placement {
        x,
        y,
        text_width: width,
        rect: Rect::from_corners(
            min_x - RECT_PADDING,
            min_y - RECT_PADDING,
            max_x + RECT_PADDING,
            max_y + RECT_PADDING,
        ),
    }
}

fn rotation_centre(x: f64, y: f64, width: f64, ascent: f64, descent: f64) -> (f64, f64) {
    (x + width / 2.0, y + (ascent - descent) / 2.0)
}

fn build_appearance_stream(spec: &AnnotationSpec, color: Color, placement: &Placement) -> Vec<u8> {
    let ascent = ASCENT * spec.font_size / 1000.0;
    let descent = DESCENT * spec.font_size / 1000.0;
    let (cx, cy) = rotation_centre(placement.x, placement.y, placement.text_width, ascent, descent);
    let (sin, cos) = spec.rotation.to_radians().sin_cos();

    let mut content = Vec::new();
    content.extend_from_slice(b"q\n");
    if spec.opacity < 1.0 {
        content.extend_from_slice(b"/GS0 gs\n");
    }
    content.extend_from_slice(
        format!(
            "{} {} {} {} {} {} cm\n",
            num(cos),
            num(sin),
            num(-sin),
            num(cos),
            num(cx),
            num(cy)
        )
        .as_bytes(),
    );
    content.extend_from_slice(b"BT\n");
    content.extend_from_slice(format!("/F1 {} Tf\n", num(spec.font_size)).as_bytes());
    content.extend_from_slice(
        format!("{} {} {} rg\n", num(color.r), num(color.g), num(color.b)).as_bytes(),
    );
    content.extend_from_slice(
        format!(
            "{} {} Td\n",
            num(-placement.text_width / 2.0),
            num(-(ascent - descent) / 2.0)
        )
        .as_bytes(),
    );
    content.push(b'(');
    content.extend_from_slice(&escape_literal(&encode_text(&spec.text)));
    content.extend_from_slice(b") Tj\nET\nQ\n");
    content
}

fn form_dictionary(spec: &AnnotationSpec, placement: &Placement, font_id: ObjectId) -> Dictionary {
    let mut resources = dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    };
    if spec.opacity < 1.0 {
        resources.set(
            "ExtGState",
            dictionary! {
                "GS0" => dictionary! {
                    "Type" => "ExtGState",
                    "ca" => Object::Real(spec.opacity as _),
                    "CA" => Object::Real(spec.opacity as _),
                },
            },
        );
    }
    dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "BBox" => rect_array(&placement.rect),
        "Resources" => resources,
    }
}

fn attach_to_page(doc: &mut lopdf::Document, page_id: ObjectId, annot_id: ObjectId) -> Result<()> {
    let corrupt = |e: lopdf::Error| ParseError::Corrupt(format!("page {page_id:?}: {e}"));

    // Copy an indirect array so pages sharing one /Annots object stay independent
    let mut annots = match doc.get_dictionary(page_id).map_err(corrupt)?.get(b"Annots") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .and_then(Object::as_array)
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    annots.push(Object::Reference(annot_id));

    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(corrupt)?
        .set("Annots", annots);
    Ok(())
}

fn rect_array(rect: &Rect) -> Vec<Object> {
    [rect.llx, rect.lly, rect.urx, rect.ury]
        .iter()
        .map(|v| Object::Real(*v as _))
        .collect()
}

/// Format a number for a content stream: at most four decimals, no exponent.
fn num(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{rounded:.4}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Encode text as WinAnsi bytes; characters outside Latin-1 become `?`.
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ 0x20..=0x7e | code @ 0xa0..=0xff => code as u8,
            _ => b'?',
        })
        .collect()
}

fn escape_literal(bytes: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                escaped.push(b'\\');
                escaped.push(b);
            }
            0x80..=0xff => escaped.extend_from_slice(format!("\\{b:03o}").as_bytes()),
            _ => escaped.push(b),
        }
    }
    escaped
}
