//! PDF Document builder for print sheets

use crate::image::{generate_image_operators, ImageXObject};
use crate::{PdfError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;
use tracing::debug;

/// PDF Document builder
///
/// Pages are created blank with an explicit size. Content is buffered per
/// page and written once when the document is saved, so a document that is
/// dropped before `save` leaves nothing behind on disk.
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Object ID of the root Pages node
    pages_id: ObjectId,
    /// Page object IDs in page order
    page_ids: Vec<ObjectId>,
    /// Page heights in points (page number - 1 -> height)
    page_heights: Vec<f64>,
    /// Embedded images (data hash -> PDF object ID)
    embedded_images: HashMap<u64, ObjectId>,
    /// Page image resources (page number -> resource name -> object ID)
    page_image_resources: HashMap<usize, Vec<(String, ObjectId)>>,
    /// Next image resource number
    next_image_resource: u32,
    /// Buffered content operators per page (page number -> operators)
    page_content_buffer: HashMap<usize, Vec<u8>>,
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfDocument {
    /// Create an empty document with no pages
    pub fn new() -> Self {
        let mut inner = Document::with_version("1.5");
        let pages_id = inner.new_object_id();

        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        inner.trailer.set("Root", catalog_id);

        Self {
            inner,
            pages_id,
            page_ids: Vec::new(),
            page_heights: Vec::new(),
            embedded_images: HashMap::new(),
            page_image_resources: HashMap::new(),
            next_image_resource: 1,
            page_content_buffer: HashMap::new(),
        }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Add a blank page
    ///
    /// # Arguments
    /// * `width` - Page width in points
    /// * `height` - Page height in points
    ///
    /// # Returns
    /// New page number (1-indexed)
    pub fn add_page(&mut self, width: f64, height: f64) -> Result<usize> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(PdfError::InvalidPageSize(width, height));
        }

        let page_id = self.inner.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ],
            "Resources" => Dictionary::new(),
        });

        self.page_ids.push(page_id);
        self.page_heights.push(height);

        let page = self.page_ids.len();
        debug!(page, width, height, "added page");
        Ok(page)
    }

    /// Insert an image
    ///
    /// # Arguments
    /// * `data` - Image file bytes (JPEG or PNG)
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points (from left)
    /// * `y` - Y coordinate in points (from top)
    /// * `width` - Image width in points
    /// * `height` - Image height in points
    pub fn insert_image(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let page_height = self.page_height(page)?;

        let resource_name = self.get_or_create_image_ref(data, page)?;

        // Convert Y coordinate from top-origin to PDF bottom-origin
        let pdf_y = page_height - y - height;

        let operators = generate_image_operators(&resource_name, x, pdf_y, width, height);
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(&operators);

        Ok(())
    }

    /// Save the document to a file
    ///
    /// # Arguments
    /// * `path` - Output file path
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.finalize()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Access the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    fn page_height(&self, page: usize) -> Result<f64> {
        if page == 0 || page > self.page_ids.len() {
            return Err(PdfError::InvalidPage(page, self.page_ids.len()));
        }
        Ok(self.page_heights[page - 1])
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        self.page_ids
            .get(page.wrapping_sub(1))
            .copied()
            .ok_or(PdfError::InvalidPage(page, self.page_ids.len()))
    }

    /// Write the page tree, resources and content streams
    fn finalize(&mut self) -> Result<()> {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        self.inner.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.page_ids.len() as i64,
            }),
        );

        for page in 1..=self.page_ids.len() {
            self.write_page_resources(page)?;
        }

        // Take ownership of buffer to avoid borrow issues
        let buffers: Vec<(usize, Vec<u8>)> = self.page_content_buffer.drain().collect();
        for (page, content) in buffers {
            let page_id = self.page_id(page)?;
            let stream_id = self.inner.add_object(Stream::new(Dictionary::new(), content));
            self.page_dict_mut(page_id)?
                .set("Contents", Object::Reference(stream_id));
        }

        Ok(())
    }

    /// Get or create an image reference for a specific page
    ///
    /// Returns the resource name (e.g., "Im1", "Im2"). Images are
    /// deduplicated by hash of their data.
    fn get_or_create_image_ref(&mut self, data: &[u8], page: usize) -> Result<String> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        let object_id = match self.embedded_images.get(&data_hash) {
            Some(object_id) => *object_id,
            None => {
                let xobject = ImageXObject::from_bytes(data).map_err(|e| {
                    PdfError::ImageError(format!("Failed to create image XObject: {e}"))
                })?;
                let object_id = self.inner.add_object(xobject.to_pdf_stream());
                self.embedded_images.insert(data_hash, object_id);
                object_id
            }
        };

        let page_resources = self.page_image_resources.entry(page).or_default();
        if let Some((name, _)) = page_resources.iter().find(|(_, id)| *id == object_id) {
            return Ok(name.clone());
        }

        let resource_name = format!("Im{}", self.next_image_resource);
        self.next_image_resource += 1;
        page_resources.push((resource_name.clone(), object_id));

        Ok(resource_name)
    }

    /// Write the XObject dictionary of a page's Resources
    fn write_page_resources(&mut self, page: usize) -> Result<()> {
        let Some(images) = self.page_image_resources.get(&page) else {
            return Ok(());
        };

        let mut xobjects = Dictionary::new();
        for (name, id) in images {
            xobjects.set(name.as_bytes(), Object::Reference(*id));
        }

        let page_id = self.page_id(page)?;
        let page_dict = self.page_dict_mut(page_id)?;
        let mut resources = match page_dict.get(b"Resources") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };
        resources.set("XObject", Object::Dictionary(xobjects));
        page_dict.set("Resources", Object::Dictionary(resources));

        Ok(())
    }

    fn page_dict_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary> {
        self.inner
            .get_object_mut(page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = PdfDocument::new();
        assert_eq!(doc.page_count(), 0);
    }

    #[test]
    fn test_add_page_numbers() {
        let mut doc = PdfDocument::new();
        assert_eq!(doc.add_page(595.28, 841.89).unwrap(), 1);
        assert_eq!(doc.add_page(595.28, 841.89).unwrap(), 2);
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_add_page_rejects_empty_size() {
        let mut doc = PdfDocument::new();
        assert!(matches!(
            doc.add_page(0.0, 100.0),
            Err(PdfError::InvalidPageSize(_, _))
        ));
        assert!(doc.add_page(100.0, f64::NAN).is_err());
    }

    #[test]
    fn test_insert_image_invalid_page() {
        let mut doc = PdfDocument::new();
        doc.add_page(100.0, 100.0).unwrap();
        let result = doc.insert_image(&[0u8; 16], 2, 0.0, 0.0, 10.0, 10.0);
        assert!(matches!(result, Err(PdfError::InvalidPage(2, 1))));
        let result = doc.insert_image(&[0u8; 16], 0, 0.0, 0.0, 10.0, 10.0);
        assert!(matches!(result, Err(PdfError::InvalidPage(0, 1))));
    }

    #[test]
    fn test_insert_image_rejects_garbage() {
        let mut doc = PdfDocument::new();
        doc.add_page(100.0, 100.0).unwrap();
        let result = doc.insert_image(&[0u8; 16], 1, 0.0, 0.0, 10.0, 10.0);
        assert!(matches!(result, Err(PdfError::ImageError(_))));
    }

    #[test]
    fn test_empty_document_serializes() {
        let mut doc = PdfDocument::new();
        doc.add_page(200.0, 300.0).unwrap();
        let bytes = doc.to_bytes().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 1);
    }
}
