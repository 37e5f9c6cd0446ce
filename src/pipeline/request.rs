//! Request building: instructions plus page images in one multimodal request.

use crate::model::PageImage;
use edgequake_llm::ChatMessage;

/// The single request sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    /// Instruction text, sent unchanged.
    pub instructions: String,
    /// Page images in document order.
    pub images: Vec<PageImage>,
}

impl ExtractionRequest {
    /// Render the request as chat messages: one user turn carrying the
    /// instructions as text and every page as an image attachment.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        let attachments = self.images.iter().map(PageImage::to_image_data).collect();
        vec![ChatMessage::user_with_images(&self.instructions, attachments)]
    }

    /// Total base64 payload across all images, in bytes.
    pub fn payload_bytes(&self) -> usize {
        self.images.iter().map(|p| p.png_base64.len()).sum()
    }
}

/// Pair `instructions` with `pages`, ordering images by page index.
pub fn build_request(instructions: &str, mut pages: Vec<PageImage>) -> ExtractionRequest {
    pages.sort_by_key(|p| p.index);
    ExtractionRequest {
        instructions: instructions.to_string(),
        images: pages,
    }
}
