//! Document renderer
//!
//! The rendering collaborator behind search and seek: load the original
//! bytes, report per-page geometry, draw highlight rectangles, serialize.
//! The production backend is lopdf; every pass starts from a fresh load of
//! the pristine original, so highlights never accumulate.

use std::collections::HashMap;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::types::{DrawRect, HighlightColor, PageGeometry, RenderError};

/// Resource-name prefix for the translucency graphics states
const GSTATE_PREFIX: &str = "GShl";

/// Geometry used when a page carries no usable MediaBox (US Letter)
const FALLBACK_GEOMETRY: PageGeometry = PageGeometry {
    width: 612.0,
    height: 792.0,
};

/// Loads raw document bytes into a mutable handle.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn load(&self, bytes: &[u8]) -> Result<Box<dyn DocumentHandle>, RenderError>;
}

/// An in-progress output document.
///
/// `draw_rectangle` takes coordinates in the convention of [`DrawRect`]:
/// x right of the left edge, y down from the top edge, negative height
/// extending further downward.
#[async_trait]
pub trait DocumentHandle: Send {
    fn page_count(&self) -> usize;

    fn page_geometry(&self, page: usize) -> Result<PageGeometry, RenderError>;

    fn draw_rectangle(
        &mut self,
        page: usize,
        rect: DrawRect,
        color: HighlightColor,
        opacity: f32,
    ) -> Result<(), RenderError>;

    async fn save(&mut self) -> Result<Vec<u8>, RenderError>;
}

#[cfg(test)]
impl std::fmt::Debug for dyn DocumentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentHandle").finish_non_exhaustive()
    }
}

/// lopdf-backed renderer
#[derive(Debug, Default)]
pub struct LopdfRenderer;

impl LopdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentRenderer for LopdfRenderer {
    async fn load(&self, bytes: &[u8]) -> Result<Box<dyn DocumentHandle>, RenderError> {
        Ok(Box::new(LopdfDocument::from_bytes(bytes)?))
    }
}

struct PendingDraw {
    rect: DrawRect,
    color: HighlightColor,
    opacity: f32,
}

/// A loaded document plus the rectangles queued against it.
///
/// Draws are buffered per page and applied as a single content-stream
/// rewrite when the document is saved.
pub struct LopdfDocument {
    doc: Document,
    pages: Vec<ObjectId>,
    geometries: Vec<PageGeometry>,
    pending: Vec<Vec<PendingDraw>>,
    gstates: HashMap<u32, (String, ObjectId)>,
}

impl LopdfDocument {
    fn from_bytes(bytes: &[u8]) -> Result<Self, RenderError> {
        if bytes
            .windows("/Encrypt".len())
            .any(|window| window == b"/Encrypt")
        {
            return Err(RenderError::Encrypted);
        }

        let doc = Document::load_mem(bytes).map_err(|e| RenderError::Load(e.to_string()))?;
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(RenderError::Load("document has no pages".to_string()));
        }

        let geometries = pages.iter().map(|&id| page_geometry_of(&doc, id)).collect();
        let pending = pages.iter().map(|_| Vec::new()).collect();

        Ok(Self {
            doc,
            pages,
            geometries,
            pending,
            gstates: HashMap::new(),
        })
    }

    fn check_page(&self, page: usize) -> Result<(), RenderError> {
        if page >= self.pages.len() {
            return Err(RenderError::PageOutOfRange {
                page,
                page_count: self.pages.len(),
            });
        }
        Ok(())
    }

    /// Get or register the ExtGState carrying the fill/stroke alpha.
    fn gstate_for(&mut self, opacity: f32) -> (String, ObjectId) {
        let key = (opacity * 100.0).round() as u32;
        if let Some((name, id)) = self.gstates.get(&key) {
            return (name.clone(), *id);
        }

        let name = format!("{}{}", GSTATE_PREFIX, key);
        let id = self.doc.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => opacity,
            "CA" => opacity,
        });
        self.gstates.insert(key, (name.clone(), id));
        (name, id)
    }

    /// Register graphics states in the page's resource dictionary.
    ///
    /// Resources shared between pages through an indirect reference are
    /// cloned onto this page before editing, so other pages are untouched.
    fn attach_gstates(
        &mut self,
        page_id: ObjectId,
        states: &[(String, ObjectId)],
    ) -> Result<(), RenderError> {
        let mut resources: Dictionary = {
            let page = self.doc.get_dictionary(page_id).map_err(save_err)?;
            match page.get(b"Resources") {
                Ok(Object::Reference(id)) => {
                    self.doc.get_dictionary(*id).map_err(save_err)?.clone()
                }
                Ok(Object::Dictionary(dict)) => dict.clone(),
                _ => Dictionary::new(),
            }
        };

        let mut ext_gstate: Dictionary = match resources.get(b"ExtGState") {
            Ok(Object::Reference(id)) => self.doc.get_dictionary(*id).map_err(save_err)?.clone(),
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };
        for (name, id) in states {
            ext_gstate.set(name.clone(), Object::Reference(*id));
        }

        resources.set("ExtGState", Object::Dictionary(ext_gstate));
        let page = self.doc.get_dictionary_mut(page_id).map_err(save_err)?;
        page.set("Resources", Object::Dictionary(resources));
        Ok(())
    }

    /// Replace the page's content with the original operators (fenced by
    /// `q`/`Q` so their graphics state cannot leak) plus the highlights.
    fn append_content(&mut self, page_id: ObjectId, ops: Vec<Operation>) -> Result<(), RenderError> {
        let existing = self.doc.get_page_content(page_id).map_err(save_err)?;
        let overlay = Content { operations: ops }.encode().map_err(save_err)?;

        let mut combined = Vec::with_capacity(existing.len() + overlay.len() + 4);
        combined.extend_from_slice(b"q\n");
        combined.extend_from_slice(&existing);
        combined.extend_from_slice(b"\nQ\n");
        combined.extend_from_slice(&overlay);

        let stream_id = self.doc.add_object(Stream::new(dictionary! {}, combined));
        let page = self.doc.get_dictionary_mut(page_id).map_err(save_err)?;
        page.set("Contents", Object::Reference(stream_id));
        Ok(())
    }

    fn apply_pending(&mut self) -> Result<(), RenderError> {
        for page in 0..self.pages.len() {
            let draws = std::mem::take(&mut self.pending[page]);
            if draws.is_empty() {
                continue;
            }

            let page_id = self.pages[page];
            let geometry = self.geometries[page];

            let mut ops: Vec<Operation> = Vec::new();
            let mut states: Vec<(String, ObjectId)> = Vec::new();
            for draw in &draws {
                let (name, id) = self.gstate_for(draw.opacity);
                if !states.iter().any(|(existing, _)| existing == &name) {
                    states.push((name.clone(), id));
                }
                ops.extend(rect_operations(&name, draw, geometry));
            }

            self.attach_gstates(page_id, &states)?;
            self.append_content(page_id, ops)?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentHandle for LopdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_geometry(&self, page: usize) -> Result<PageGeometry, RenderError> {
        self.check_page(page)?;
        Ok(self.geometries[page])
    }

    fn draw_rectangle(
        &mut self,
        page: usize,
        rect: DrawRect,
        color: HighlightColor,
        opacity: f32,
    ) -> Result<(), RenderError> {
        self.check_page(page)?;
        self.pending[page].push(PendingDraw {
            rect,
            color,
            opacity,
        });
        Ok(())
    }

    async fn save(&mut self) -> Result<Vec<u8>, RenderError> {
        self.apply_pending()?;
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| RenderError::Save(e.to_string()))?;
        Ok(buffer)
    }
}

fn save_err(err: lopdf::Error) -> RenderError {
    RenderError::Save(err.to_string())
}

fn page_geometry_of(doc: &Document, page_id: ObjectId) -> PageGeometry {
    doc.get_dictionary(page_id)
        .ok()
        .and_then(|dict| dict.get(b"MediaBox").ok())
        .and_then(|obj| obj.as_array().ok())
        .and_then(|array| {
            if array.len() != 4 {
                return None;
            }
            let x0 = array[0].as_float().ok()?;
            let y0 = array[1].as_float().ok()?;
            let x1 = array[2].as_float().ok()?;
            let y1 = array[3].as_float().ok()?;
            Some(PageGeometry {
                width: ((x1 - x0).abs()) as f64,
                height: ((y1 - y0).abs()) as f64,
            })
        })
        .unwrap_or(FALLBACK_GEOMETRY)
}

/// Content-stream operators for one rectangle.
///
/// The anchor point sits `rect.y` below the page's top edge; PDF user
/// space has its origin at the bottom-left, so the anchor converts to
/// `page_height - rect.y`. A negative height re-anchors downward so the
/// emitted `re` always has a positive extent.
fn rect_operations(gs_name: &str, draw: &PendingDraw, geometry: PageGeometry) -> Vec<Operation> {
    let rect = draw.rect;
    let anchor_y = geometry.height - rect.y;
    let (y0, height) = if rect.height < 0.0 {
        (anchor_y + rect.height, -rect.height)
    } else {
        (anchor_y, rect.height)
    };

    vec![
        Operation::new("q", vec![]),
        Operation::new("gs", vec![Object::Name(gs_name.as_bytes().to_vec())]),
        Operation::new(
            "rg",
            vec![draw.color.r.into(), draw.color.g.into(), draw.color.b.into()],
        ),
        Operation::new(
            "re",
            vec![
                (rect.x as f32).into(),
                (y0 as f32).into(),
                (rect.width as f32).into(),
                (height as f32).into(),
            ],
        ),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Recording fakes shared by highlighter and store tests
#[cfg(test)]
pub mod testing {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::super::types::{DrawRect, HighlightColor, PageGeometry, RenderError};
    use super::{DocumentHandle, DocumentRenderer};

    const TEST_GEOMETRY: PageGeometry = PageGeometry {
        width: 100.0,
        height: 140.0,
    };

    #[derive(Debug, Clone)]
    pub struct RecordedDraw {
        pub page: usize,
        pub rect: DrawRect,
        pub color: HighlightColor,
        pub opacity: f32,
    }

    /// Handle that records rectangles instead of rendering them.
    /// Every page reports 100x140 geometry; `save` returns a payload
    /// carrying the number of rectangles drawn.
    pub struct RecordingHandle {
        page_count: usize,
        local: Vec<RecordedDraw>,
        shared: Option<Arc<Mutex<Vec<RecordedDraw>>>>,
    }

    impl RecordingHandle {
        pub fn with_pages(page_count: usize) -> Self {
            Self {
                page_count,
                local: Vec::new(),
                shared: None,
            }
        }

        pub fn draws(&self) -> Vec<RecordedDraw> {
            self.local.clone()
        }
    }

    #[async_trait]
    impl DocumentHandle for RecordingHandle {
        fn page_count(&self) -> usize {
            self.page_count
        }

        fn page_geometry(&self, page: usize) -> Result<PageGeometry, RenderError> {
            if page >= self.page_count {
                return Err(RenderError::PageOutOfRange {
                    page,
                    page_count: self.page_count,
                });
            }
            Ok(TEST_GEOMETRY)
        }

        fn draw_rectangle(
            &mut self,
            page: usize,
            rect: DrawRect,
            color: HighlightColor,
            opacity: f32,
        ) -> Result<(), RenderError> {
            if page >= self.page_count {
                return Err(RenderError::PageOutOfRange {
                    page,
                    page_count: self.page_count,
                });
            }
            let draw = RecordedDraw {
                page,
                rect,
                color,
                opacity,
            };
            if let Some(shared) = &self.shared {
                shared.lock().push(draw.clone());
            }
            self.local.push(draw);
            Ok(())
        }

        async fn save(&mut self) -> Result<Vec<u8>, RenderError> {
            Ok(format!("highlighted:{}", self.local.len()).into_bytes())
        }
    }

    /// Renderer producing recording handles, with counters shared across
    /// every handle it hands out.
    #[derive(Clone)]
    pub struct RecordingRenderer {
        page_count: usize,
        loads: Arc<Mutex<usize>>,
        draws: Arc<Mutex<Vec<RecordedDraw>>>,
    }

    impl RecordingRenderer {
        pub fn with_pages(page_count: usize) -> Self {
            Self {
                page_count,
                loads: Arc::new(Mutex::new(0)),
                draws: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn load_count(&self) -> usize {
            *self.loads.lock()
        }

        pub fn draw_count(&self) -> usize {
            self.draws.lock().len()
        }
    }

    #[async_trait]
    impl DocumentRenderer for RecordingRenderer {
        async fn load(&self, _bytes: &[u8]) -> Result<Box<dyn DocumentHandle>, RenderError> {
            *self.loads.lock() += 1;
            Ok(Box::new(RecordingHandle {
                page_count: self.page_count,
                local: Vec::new(),
                shared: Some(self.draws.clone()),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal PDF with one page per entry in `dims`.
    fn build_pdf(dims: &[(f32, f32)]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::new();
        for &(width, height) in dims {
            let content = Content {
                operations: vec![Operation::new("BT", vec![]), Operation::new("ET", vec![])],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode fixture content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![
                    0.into(),
                    0.into(),
                    Object::Real(width),
                    Object::Real(height),
                ],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("serialize fixture");
        buffer
    }

    #[tokio::test]
    async fn test_load_reports_media_box_geometry() {
        let bytes = build_pdf(&[(612.0, 792.0), (595.0, 842.0)]);
        let handle = LopdfRenderer::new().load(&bytes).await.unwrap();

        assert_eq!(handle.page_count(), 2);
        let first = handle.page_geometry(0).unwrap();
        assert_eq!(first.width, 612.0);
        assert_eq!(first.height, 792.0);
        let second = handle.page_geometry(1).unwrap();
        assert_eq!(second.width, 595.0);
        assert_eq!(second.height, 842.0);
    }

    #[tokio::test]
    async fn test_page_out_of_range() {
        let bytes = build_pdf(&[(612.0, 792.0)]);
        let handle = LopdfRenderer::new().load(&bytes).await.unwrap();

        let err = handle.page_geometry(3).unwrap_err();
        assert!(matches!(
            err,
            RenderError::PageOutOfRange {
                page: 3,
                page_count: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_encrypted_documents_are_rejected() {
        let bytes = b"%PDF-1.4\n1 0 obj\n<< /Encrypt 2 0 R >>\nendobj\n".to_vec();
        let err = LopdfRenderer::new().load(&bytes).await.unwrap_err();
        assert!(matches!(err, RenderError::Encrypted));
    }

    #[tokio::test]
    async fn test_garbage_bytes_fail_to_load() {
        let err = LopdfRenderer::new().load(b"not a pdf").await.unwrap_err();
        assert!(matches!(err, RenderError::Load(_)));
    }

    #[tokio::test]
    async fn test_draw_and_save_produces_reloadable_output() {
        let bytes = build_pdf(&[(612.0, 792.0)]);
        let mut handle = LopdfRenderer::new().load(&bytes).await.unwrap();

        handle
            .draw_rectangle(
                0,
                DrawRect {
                    x: 72.0,
                    y: 72.0,
                    width: 120.0,
                    height: -14.0,
                },
                HighlightColor::rgb(1.0, 1.0, 0.0),
                0.5,
            )
            .unwrap();
        let saved = handle.save().await.unwrap();

        let reloaded = Document::load_mem(&saved).unwrap();
        let page_id = *reloaded.get_pages().values().next().unwrap();
        let content = reloaded.get_page_content(page_id).unwrap();
        let parsed = Content::decode(&content).unwrap();

        let ops: Vec<&str> = parsed
            .operations
            .iter()
            .map(|op| op.operator.as_str())
            .collect();
        assert!(ops.contains(&"re"), "highlight rectangle missing: {:?}", ops);
        assert!(ops.contains(&"gs"), "graphics state missing: {:?}", ops);
        assert!(ops.contains(&"BT"), "original content lost: {:?}", ops);
    }

    #[tokio::test]
    async fn test_rectangle_lands_at_pdf_coordinates() {
        // y is 100pt down from the top with a 20pt downward extent, so in
        // PDF space the band spans [792-120, 792-100].
        let draw = PendingDraw {
            rect: DrawRect {
                x: 30.0,
                y: 100.0,
                width: 50.0,
                height: -20.0,
            },
            color: HighlightColor::rgb(1.0, 1.0, 0.0),
            opacity: 0.5,
        };
        let ops = rect_operations(
            "GShl50",
            &draw,
            PageGeometry {
                width: 612.0,
                height: 792.0,
            },
        );

        let re = ops.iter().find(|op| op.operator == "re").unwrap();
        let operands: Vec<f32> = re
            .operands
            .iter()
            .map(|obj| obj.as_float().unwrap())
            .collect();
        assert_eq!(operands, vec![30.0, 672.0, 50.0, 20.0]);
    }

    #[tokio::test]
    async fn test_save_without_draws_round_trips() {
        let bytes = build_pdf(&[(612.0, 792.0)]);
        let mut handle = LopdfRenderer::new().load(&bytes).await.unwrap();
        let saved = handle.save().await.unwrap();

        assert!(Document::load_mem(&saved).is_ok());
    }
}
