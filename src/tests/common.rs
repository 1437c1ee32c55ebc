use lopdf::{Document, Object, Stream, dictionary};

/// Builds small in-memory PDFs for tests.
pub struct PdfBuilder {
    pages: u32,
    inherited_media_box: Option<[i64; 4]>,
    page_tree: bool,
    referenced_annots: bool,
    cyclic_kids: bool,
    declared_count: Option<i64>,
    page_rotation: Option<i64>,
}

impl PdfBuilder {
    pub fn new(pages: u32) -> Self {
        Self {
            pages,
            inherited_media_box: None,
            page_tree: true,
            referenced_annots: false,
            cyclic_kids: false,
            declared_count: None,
            page_rotation: None,
        }
    }

    /// Put the media box on the `/Pages` node only, so pages inherit it.
    pub fn inherited_media_box(mut self, media_box: [i64; 4]) -> Self {
        self.inherited_media_box = Some(media_box);
        self
    }

    /// Drop the catalog's `/Pages` entry.
    pub fn without_page_tree(mut self) -> Self {
        self.page_tree = false;
        self
    }

    /// Give every page an indirect, already-populated `/Annots` array.
    pub fn referenced_annots(mut self) -> Self {
        self.referenced_annots = true;
        self
    }

    /// List the `/Pages` node among its own `/Kids`.
    pub fn cyclic_kids(mut self) -> Self {
        self.cyclic_kids = true;
        self
    }

    /// Override the `/Count` written on the `/Pages` node.
    pub fn declared_count(mut self, count: i64) -> Self {
        self.declared_count = Some(count);
        self
    }

    /// Set `/Rotate` on every page.
    pub fn page_rotation(mut self, degrees: i64) -> Self {
        self.page_rotation = Some(degrees);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for number in 1..=self.pages {
            let content = format!("BT /F1 12 Tf 72 720 Td (Test page {number}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            };
            if self.inherited_media_box.is_none() {
                page.set("MediaBox", letter_media_box());
            }
            if let Some(degrees) = self.page_rotation {
                page.set("Rotate", degrees);
            }
            if self.referenced_annots {
                let link_id = doc.add_object(dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Link",
                    "Rect" => [0, 0, 10, 10]
                        .iter()
                        .map(|v| Object::Integer(*v))
                        .collect::<Vec<_>>(),
                });
                let annots_id = doc.add_object(Object::Array(vec![link_id.into()]));
                page.set("Annots", annots_id);
            }
            kids.push(doc.add_object(page).into());
        }

        if self.cyclic_kids {
            kids.push(pages_id.into());
        }

        let mut pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.declared_count.unwrap_or(self.pages as i64),
        };
        if let Some(media_box) = self.inherited_media_box {
            pages.set(
                "MediaBox",
                media_box.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
            );
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = if self.page_tree {
            doc.add_object(dictionary! {
                "Type" => "Catalog",
                "Pages" => pages_id,
            })
        } else {
            doc.add_object(dictionary! { "Type" => "Catalog" })
        };
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("failed to serialise test PDF");
        buffer
    }
}

fn letter_media_box() -> Vec<Object> {
    [0, 0, 612, 792].iter().map(|v| Object::Integer(*v)).collect()
}

/// A well-formed US Letter PDF with `pages` pages.
pub fn sample_pdf(pages: u32) -> Vec<u8> {
    PdfBuilder::new(pages).build()
}

/// Count `/Subtype /Watermark` annotations attached to each page, keyed by
/// page number.
pub fn watermark_counts(bytes: &[u8]) -> Vec<(u32, usize)> {
    let doc = Document::load_mem(bytes).expect("annotated output must parse");
    doc.get_pages()
        .into_iter()
        .map(|(number, page_id)| {
            let page = doc.get_dictionary(page_id).expect("page dictionary");
            let annots = match page.get(b"Annots") {
                Ok(Object::Array(items)) => items.clone(),
                Ok(Object::Reference(id)) => doc
                    .get_object(*id)
                    .and_then(Object::as_array)
                    .cloned()
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
            let count = annots
                .iter()
                .filter_map(|a| a.as_reference().ok())
                .filter_map(|id| doc.get_dictionary(id).ok())
                .filter(|d| {
                    matches!(d.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Watermark")
                })
                .count();
            (number, count)
        })
        .collect()
}

/// Pages that carry at least one watermark.
pub fn watermarked_pages(bytes: &[u8]) -> Vec<u32> {
    watermark_counts(bytes)
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(number, _)| number)
        .collect()
}
