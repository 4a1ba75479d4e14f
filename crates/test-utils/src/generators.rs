//! Test data generators for preview content.

use layer_document::Preview;

/// Creates a preview with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_preview;
///
/// let preview = create_test_preview(10, 5);
/// assert_eq!(preview.data.len(), 50);
/// assert_eq!(preview.data[1], 1000.0); // col=1, row=0
/// assert_eq!(preview.data[10], 1.0);   // col=0, row=1
/// ```
pub fn create_test_preview(width: usize, height: usize) -> Preview {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    Preview::new(width, height, data)
}
