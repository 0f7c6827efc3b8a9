use uuid::Uuid;

use crate::model::Draft;

/// One field of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

impl Part {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The field value as text, for parts that carry UTF-8.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

/// An assembled `multipart/form-data` body with a random boundary. Parts
/// are kept inspectable so tests (and shells, if they want to re-encode)
/// can read fields without parsing the framing back.
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<Part>,
}

impl MultipartForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary: format!("----ecopoint-{}", Uuid::new_v4().simple()),
            parts: Vec::new(),
        }
    }

    pub fn text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parts.push(Part {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: value.into().into_bytes(),
        });
    }

    pub fn file(
        &mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) {
        self.parts.push(Part {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            data,
        });
    }

    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    #[must_use]
    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|part| part.name == name)
    }

    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// RFC 7578 framing of the collected parts.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::new();

        for part in &self.parts {
            body.extend_from_slice(b"--");
            body.extend_from_slice(self.boundary.as_bytes());
            body.extend_from_slice(b"\r\n");

            body.extend_from_slice(b"Content-Disposition: form-data; name=\"");
            body.extend_from_slice(escape_quoted(&part.name).as_bytes());
            body.extend_from_slice(b"\"");
            if let Some(file_name) = &part.file_name {
                body.extend_from_slice(b"; filename=\"");
                body.extend_from_slice(escape_quoted(file_name).as_bytes());
                body.extend_from_slice(b"\"");
            }
            body.extend_from_slice(b"\r\n");

            if let Some(content_type) = &part.content_type {
                body.extend_from_slice(b"Content-Type: ");
                body.extend_from_slice(content_type.as_bytes());
                body.extend_from_slice(b"\r\n");
            }

            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(&part.data);
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(b"--");
        body.extend_from_slice(self.boundary.as_bytes());
        body.extend_from_slice(b"--\r\n");

        body
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

// Quotes, backslashes and line breaks would corrupt the Content-Disposition
// header; everything else passes through untouched.
fn escape_quoted(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '"' => "\\\"".to_string(),
            '\\' => "\\\\".to_string(),
            '\r' | '\n' => " ".to_string(),
            other => other.to_string(),
        })
        .collect()
}

/// Serializes the draft into the create-point payload. Latitude/longitude
/// use the shortest round-trippable decimal form, item ids keep their
/// selection order, and the image part is attached only when present.
#[must_use]
pub fn create_point_form(draft: &Draft) -> MultipartForm {
    let mut form = MultipartForm::new();

    form.text("name", draft.name.clone());
    form.text("email", draft.email.clone());
    form.text("whatsapp", draft.whatsapp.clone());
    form.text(
        "uf",
        draft.region.as_ref().map(|r| r.as_str()).unwrap_or_default(),
    );
    form.text(
        "city",
        draft.city.as_ref().map(|c| c.as_str()).unwrap_or_default(),
    );
    form.text("latitude", draft.position.lat.to_string());
    form.text("longitude", draft.position.lng.to_string());
    form.text(
        "items",
        draft
            .selected_items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
    );

    if let Some(image) = &draft.image {
        form.file(
            "image",
            image.file_name.clone(),
            image.mime_type(),
            image.data.clone(),
        );
    }

    form
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CityName, Coordinate, ImageFile, ItemId, RegionCode};

    fn sample_draft() -> Draft {
        Draft {
            name: "Recicla Já".into(),
            email: "contato@recicla.br".into(),
            whatsapp: "+55 11 99999-0000".into(),
            region: Some(RegionCode::new("SP")),
            city: Some(CityName::new("Campinas")),
            position: Coordinate::new(-22.9, -47.0),
            selected_items: vec![ItemId(3)],
            image: None,
        }
    }

    #[test]
    fn form_carries_every_field() {
        let form = create_point_form(&sample_draft());

        assert_eq!(form.part("name").unwrap().text(), Some("Recicla Já"));
        assert_eq!(form.part("email").unwrap().text(), Some("contato@recicla.br"));
        assert_eq!(form.part("whatsapp").unwrap().text(), Some("+55 11 99999-0000"));
        assert_eq!(form.part("uf").unwrap().text(), Some("SP"));
        assert_eq!(form.part("city").unwrap().text(), Some("Campinas"));
        assert_eq!(form.part("latitude").unwrap().text(), Some("-22.9"));
        assert_eq!(form.part("longitude").unwrap().text(), Some("-47"));
        assert_eq!(form.part("items").unwrap().text(), Some("3"));
        assert!(form.part("image").is_none());
    }

    #[test]
    fn coordinates_round_trip_through_their_string_form() {
        let mut draft = sample_draft();
        draft.position = Coordinate::new(-22.901234567, -47.000001);
        let form = create_point_form(&draft);

        let lat: f64 = form.part("latitude").unwrap().text().unwrap().parse().unwrap();
        let lng: f64 = form.part("longitude").unwrap().text().unwrap().parse().unwrap();
        assert_eq!(lat, -22.901234567);
        assert_eq!(lng, -47.000001);
    }

    #[test]
    fn items_keep_selection_order_unsorted() {
        let mut draft = sample_draft();
        draft.selected_items = vec![ItemId(5), ItemId(1), ItemId(3)];
        let form = create_point_form(&draft);
        assert_eq!(form.part("items").unwrap().text(), Some("5,1,3"));
    }

    #[test]
    fn empty_selection_serializes_to_empty_string() {
        let mut draft = sample_draft();
        draft.selected_items.clear();
        draft.region = None;
        draft.city = None;
        let form = create_point_form(&draft);
        assert_eq!(form.part("items").unwrap().text(), Some(""));
        assert_eq!(form.part("uf").unwrap().text(), Some(""));
        assert_eq!(form.part("city").unwrap().text(), Some(""));
    }

    #[test]
    fn image_part_is_attached_when_present() {
        let mut draft = sample_draft();
        draft.image = Some(ImageFile::new(
            "fachada.png",
            vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x01],
        ));
        let form = create_point_form(&draft);

        let image = form.part("image").unwrap();
        assert_eq!(image.file_name(), Some("fachada.png"));
        assert_eq!(image.content_type(), Some("image/png"));
        assert_eq!(image.data().len(), 9);
    }

    #[test]
    fn encoding_frames_parts_with_the_boundary() {
        let mut draft = sample_draft();
        draft.image = Some(ImageFile::new("f.bin", vec![0x00, 0x01]));
        let form = create_point_form(&draft);
        let body = form.encode();
        let text = String::from_utf8_lossy(&body);

        let delimiter = format!("--{}\r\n", form.boundary());
        assert_eq!(text.matches(&delimiter).count(), form.parts().len());
        assert!(text.ends_with(&format!("--{}--\r\n", form.boundary())));
        assert!(text.contains("Content-Disposition: form-data; name=\"uf\"\r\n\r\nSP\r\n"));
        assert!(text.contains(
            "Content-Disposition: form-data; name=\"image\"; filename=\"f.bin\"\r\n"
        ));
        assert!(text.contains("Content-Type: application/octet-stream\r\n"));
    }

    #[test]
    fn content_type_advertises_the_boundary() {
        let form = create_point_form(&sample_draft());
        assert_eq!(
            form.content_type(),
            format!("multipart/form-data; boundary={}", form.boundary())
        );
    }

    #[test]
    fn quoted_values_are_escaped_in_headers() {
        let mut form = MultipartForm::new();
        form.file("image", "we\"ird\\name.png", "image/png", vec![1]);
        let text = String::from_utf8_lossy(&form.encode()).into_owned();
        assert!(text.contains("filename=\"we\\\"ird\\\\name.png\""));
    }

    #[test]
    fn boundaries_are_unique_per_form() {
        assert_ne!(MultipartForm::new().boundary(), MultipartForm::new().boundary());
    }
}
