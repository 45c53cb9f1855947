//! Signature field placement
//!
//! Fields are stored in surface space together with the render they were
//! placed on, so they can be mapped to document space at export time no
//! matter how the page is displayed afterwards.

use crate::error::SigningError;
use crate::signature::SignatureImage;
use serde::{Deserialize, Serialize};
use shared_types::{Point, Rect, RenderedPage, Size};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(Uuid);

impl FieldId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FieldId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A signature field on one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    /// Zero-based page index
    pub page_index: usize,
    /// Top-left anchored rectangle in surface pixels of `basis`
    pub rect: Rect,
    /// The render the field was placed on
    pub basis: RenderedPage,
    #[serde(default, with = "signature_data_url")]
    pub signature: Option<SignatureImage>,
}

impl Field {
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

/// Ordered collection of fields plus the one-shot placement mode
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldModel {
    fields: Vec<Field>,
    #[serde(skip)]
    placing: bool,
}

impl FieldModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm placement mode; the next `add_field` call consumes it
    pub fn begin_placement(&mut self) {
        self.placing = true;
    }

    pub fn cancel_placement(&mut self) {
        self.placing = false;
    }

    pub fn is_placing(&self) -> bool {
        self.placing
    }

    /// Place an unsigned field of `size` centred on `center` (surface pixels)
    ///
    /// Placement mode is consumed by the call whether or not the field is
    /// accepted.
    ///
    /// # Errors
    ///
    /// * `PlacementInactive` unless `begin_placement` was called first
    /// * `InvalidFieldSize` unless both sides are positive
    pub fn add_field(
        &mut self,
        page: &RenderedPage,
        center: Point,
        size: Size,
    ) -> Result<&Field, SigningError> {
        if !std::mem::take(&mut self.placing) {
            return Err(SigningError::PlacementInactive);
        }
        if !size.is_positive() {
            return Err(SigningError::InvalidFieldSize {
                width: size.width,
                height: size.height,
            });
        }
        if !center.is_finite() {
            return Err(SigningError::InvalidSurface(format!(
                "placement point {:?} is not finite",
                center
            )));
        }

        let field = Field {
            id: FieldId::new(),
            page_index: page.page_index,
            rect: Rect::centered_at(center, size),
            basis: *page,
            signature: None,
        };
        tracing::debug!(field = %field.id, page = field.page_index, rect = ?field.rect, "field placed");
        self.fields.push(field);
        Ok(&self.fields[self.fields.len() - 1])
    }

    /// Attach the given signature to a field, replacing any previous one
    pub fn attach_signature(
        &mut self,
        id: FieldId,
        signature: Option<SignatureImage>,
    ) -> Result<&Field, SigningError> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(SigningError::UnknownField(id))?;
        let signature = signature
            .filter(|s| !s.is_empty())
            .ok_or(SigningError::NoSignatureAvailable)?;
        field.signature = Some(signature);
        Ok(field)
    }

    /// Return a field to the unsigned state
    pub fn detach_signature(&mut self, id: FieldId) -> Result<&Field, SigningError> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(SigningError::UnknownField(id))?;
        field.signature = None;
        Ok(field)
    }

    pub fn remove_field(&mut self, id: FieldId) -> Result<Field, SigningError> {
        let pos = self
            .fields
            .iter()
            .position(|f| f.id == id)
            .ok_or(SigningError::UnknownField(id))?;
        Ok(self.fields.remove(pos))
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Fields on `page_index` in placement order
    pub fn fields_for_page(&self, page_index: usize) -> impl Iterator<Item = &Field> + '_ {
        self.fields.iter().filter(move |f| f.page_index == page_index)
    }

    /// Topmost field on `page_index` containing `point`
    ///
    /// `point` is in the surface space of `page`; fields placed on an older
    /// render of the page are rescaled before testing.
    pub fn field_at(&self, page: &RenderedPage, point: Point) -> Option<&Field> {
        self.fields
            .iter()
            .rev()
            .filter(|f| f.page_index == page.page_index)
            .find(|f| shared_pdf::rescale_rect(f.rect, &f.basis, page).contains(point))
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn signed_count(&self) -> usize {
        self.fields.iter().filter(|f| f.is_signed()).count()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
        self.placing = false;
    }
}

mod signature_data_url {
    use crate::signature::SignatureImage;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<SignatureImage>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(sig) => serializer.serialize_some(&sig.to_data_url()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<SignatureImage>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|url| SignatureImage::from_data_url(&url).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::{PageDimensions, RasterImage};

    fn page(index: usize) -> RenderedPage {
        RenderedPage::new(index, PageDimensions::new(600.0, 800.0), 1.0)
    }

    fn signature() -> SignatureImage {
        let image = RasterImage::from_rgba(2, 2, [0, 0, 0, 255].repeat(4)).unwrap();
        SignatureImage::encode(&image).unwrap()
    }

    fn place(model: &mut FieldModel, index: usize, x: f64, y: f64) -> FieldId {
        model.begin_placement();
        model
            .add_field(&page(index), Point::new(x, y), Size::new(150.0, 50.0))
            .unwrap()
            .id
    }

    #[test]
    fn test_add_field_centres_rect() {
        let mut model = FieldModel::new();
        model.begin_placement();
        let field = model
            .add_field(&page(0), Point::new(100.0, 100.0), Size::new(150.0, 50.0))
            .unwrap();
        assert_eq!(field.rect, Rect::new(25.0, 75.0, 150.0, 50.0));
        assert_eq!(field.page_index, 0);
        assert!(!field.is_signed());
    }

    #[test]
    fn test_placement_is_single_shot() {
        let mut model = FieldModel::new();
        model.begin_placement();
        assert!(model.is_placing());
        model
            .add_field(&page(0), Point::new(10.0, 10.0), Size::new(150.0, 50.0))
            .unwrap();
        assert!(!model.is_placing());

        let second = model.add_field(&page(0), Point::new(20.0, 20.0), Size::new(150.0, 50.0));
        assert!(matches!(second, Err(SigningError::PlacementInactive)));
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_rejected_placement_still_consumes_mode() {
        let mut model = FieldModel::new();
        model.begin_placement();
        let result = model.add_field(&page(0), Point::new(10.0, 10.0), Size::new(0.0, 50.0));
        assert!(matches!(result, Err(SigningError::InvalidFieldSize { .. })));
        assert!(!model.is_placing());
        assert!(model.is_empty());
    }

    #[test]
    fn test_cancel_placement() {
        let mut model = FieldModel::new();
        model.begin_placement();
        model.cancel_placement();
        let result = model.add_field(&page(0), Point::new(10.0, 10.0), Size::new(1.0, 1.0));
        assert!(matches!(result, Err(SigningError::PlacementInactive)));
    }

    #[test]
    fn test_attach_requires_signature() {
        let mut model = FieldModel::new();
        let id = place(&mut model, 0, 100.0, 100.0);
        assert!(matches!(
            model.attach_signature(id, None),
            Err(SigningError::NoSignatureAvailable)
        ));
        let empty = SignatureImage::from_encoded(Vec::new(), 0, 0);
        assert!(matches!(
            model.attach_signature(id, Some(empty)),
            Err(SigningError::NoSignatureAvailable)
        ));
        assert!(!model.field(id).unwrap().is_signed());

        // Already signed: the old signature stays
        let ink = SignatureImage::from_encoded(vec![1, 2, 3], 1, 1);
        model.attach_signature(id, Some(ink.clone())).unwrap();
        assert!(matches!(
            model.attach_signature(id, None),
            Err(SigningError::NoSignatureAvailable)
        ));
        assert!(model.field(id).unwrap().signature.as_ref().unwrap().ptr_eq(&ink));
    }

    #[test]
    fn test_attach_to_unknown_field() {
        let mut model = FieldModel::new();
        let stray = FieldId::new();
        assert!(matches!(
            model.attach_signature(stray, Some(signature())),
            Err(SigningError::UnknownField(id)) if id == stray
        ));
    }

    #[test]
    fn test_fields_share_one_signature() {
        let mut model = FieldModel::new();
        let a = place(&mut model, 0, 100.0, 100.0);
        let b = place(&mut model, 1, 100.0, 100.0);
        let sig = signature();
        model.attach_signature(a, Some(sig.clone())).unwrap();
        model.attach_signature(b, Some(sig.clone())).unwrap();

        let first = model.field(a).unwrap().signature.as_ref().unwrap();
        let second = model.field(b).unwrap().signature.as_ref().unwrap();
        assert!(first.ptr_eq(second));
        assert_eq!(model.signed_count(), 2);

        model.detach_signature(a).unwrap();
        assert_eq!(model.signed_count(), 1);
    }

    #[test]
    fn test_remove_field() {
        let mut model = FieldModel::new();
        let id = place(&mut model, 0, 100.0, 100.0);
        let removed = model.remove_field(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(matches!(
            model.remove_field(id),
            Err(SigningError::UnknownField(_))
        ));
    }

    #[test]
    fn test_fields_for_page_keeps_order() {
        let mut model = FieldModel::new();
        let a = place(&mut model, 0, 100.0, 100.0);
        let _ = place(&mut model, 1, 100.0, 100.0);
        let c = place(&mut model, 0, 300.0, 300.0);

        let ids: Vec<FieldId> = model.fields_for_page(0).map(|f| f.id).collect();
        assert_eq!(ids, vec![a, c]);
        assert_eq!(model.fields_for_page(5).count(), 0);
    }

    #[test]
    fn test_field_at_prefers_topmost() {
        let mut model = FieldModel::new();
        let below = place(&mut model, 0, 100.0, 100.0);
        let above = place(&mut model, 0, 120.0, 100.0);

        assert_eq!(model.field_at(&page(0), Point::new(110.0, 100.0)).unwrap().id, above);
        assert_eq!(model.field_at(&page(0), Point::new(30.0, 100.0)).unwrap().id, below);
        assert!(model.field_at(&page(0), Point::new(500.0, 500.0)).is_none());
        assert!(model.field_at(&page(1), Point::new(110.0, 100.0)).is_none());
    }

    #[test]
    fn test_field_at_on_zoomed_render() {
        let mut model = FieldModel::new();
        let id = place(&mut model, 0, 100.0, 100.0);
        let zoomed = RenderedPage::new(0, PageDimensions::new(600.0, 800.0), 2.0);
        assert_eq!(model.field_at(&zoomed, Point::new(200.0, 200.0)).unwrap().id, id);
        assert!(model.field_at(&zoomed, Point::new(100.0, 100.0)).is_none());
    }

    #[test]
    fn test_field_serialization() {
        let mut model = FieldModel::new();
        let id = place(&mut model, 0, 100.0, 100.0);
        model.attach_signature(id, Some(signature())).unwrap();
        let _ = place(&mut model, 0, 300.0, 300.0);

        let json = serde_json::to_string(&model).unwrap();
        assert!(json.contains("data:image/png;base64,"));
        assert!(json.contains(&id.to_string()));

        let back: FieldModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fields(), model.fields());
        assert!(!back.is_placing());
    }

    #[test]
    fn test_clear() {
        let mut model = FieldModel::new();
        place(&mut model, 0, 100.0, 100.0);
        model.begin_placement();
        model.clear();
        assert!(model.is_empty());
        assert!(!model.is_placing());
    }
}
