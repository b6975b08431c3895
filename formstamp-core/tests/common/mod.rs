//! Fixture documents and spreadsheets shared by the integration tests

#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use flate2::Compression;
use formstamp::batch::{FormTemplate, TemplateKind, TemplateSet};
use formstamp::{
    resolve_fields, CellValue, Dictionary, Document, Object, ObjectId, Sheet, Stream,
    REQUIRED_COLUMNS,
};
use std::io::Write;

pub const WORKSHEET_FIELDS: &[&str] = &[
    "number",
    "proposed-class",
    "name",
    "country",
    "date",
    "competition",
    "xnumber",
    "xproposed-class",
    "xname",
    "xcountry",
    "xdate",
    "xcompetition",
];

pub const ASSESSMENT_FIELDS: &[&str] = &["name", "country", "dob"];

fn rect(values: [i64; 4]) -> Vec<Object> {
    values.into_iter().map(Object::Integer).collect()
}

fn appearance(doc: &mut Document) -> ObjectId {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::name("XObject"));
    dict.set("Subtype", Object::name("Form"));
    dict.set("BBox", rect([0, 0, 200, 20]));
    doc.add_object(Stream::new(dict, b"/Tx BMC EMC".to_vec()))
}

fn widget(doc: &mut Document, page: ObjectId) -> ObjectId {
    let normal = appearance(doc);
    let mut ap = Dictionary::new();
    ap.set("N", normal);

    let mut dict = Dictionary::new();
    dict.set("Type", Object::name("Annot"));
    dict.set("Subtype", Object::name("Widget"));
    dict.set("P", page);
    dict.set("Rect", rect([50, 700, 250, 720]));
    dict.set("AP", ap);
    doc.add_object(dict)
}

/// Single-page form whose text fields each have one or two widget kids with
/// appearance streams, plus a checkbox merged with its widget
pub fn form_document(field_names: &[&str]) -> Document {
    let mut doc = Document::new();

    let pages_id = ObjectId::new(1, 0);
    let page_id = ObjectId::new(2, 0);
    let mut page = Dictionary::new();
    page.set("Type", Object::name("Page"));
    page.set("Parent", pages_id);
    page.set("MediaBox", rect([0, 0, 595, 842]));
    doc.set_object(page_id, page);
    let mut pages = Dictionary::new();
    pages.set("Type", Object::name("Pages"));
    pages.set("Kids", vec![Object::Reference(page_id)]);
    pages.set("Count", 1);
    doc.set_object(pages_id, pages);

    let mut fields = Vec::new();
    let mut annots = Vec::new();
    for (index, name) in field_names.iter().enumerate() {
        let widget_count = if index % 2 == 0 { 1 } else { 2 };
        let widgets: Vec<ObjectId> = (0..widget_count)
            .map(|_| widget(&mut doc, page_id))
            .collect();

        let mut field = Dictionary::new();
        field.set("T", Object::text(name));
        field.set("FT", Object::name("Tx"));
        field.set("DA", Object::text("/Helv 10 Tf 0 g"));
        field.set(
            "Kids",
            widgets
                .iter()
                .copied()
                .map(Object::Reference)
                .collect::<Vec<_>>(),
        );
        let field_id = doc.add_object(field);
        for widget in &widgets {
            if let Some(dict) = doc.get_dictionary_mut(*widget) {
                dict.set("Parent", field_id);
            }
        }
        annots.extend(widgets.into_iter().map(Object::Reference));
        fields.push(Object::Reference(field_id));
    }

    let on = appearance(&mut doc);
    let mut states = Dictionary::new();
    states.set("Yes", on);
    let mut ap = Dictionary::new();
    ap.set("N", states);
    let mut checkbox = Dictionary::new();
    checkbox.set("T", Object::text("agree"));
    checkbox.set("FT", Object::name("Btn"));
    checkbox.set("V", Object::name("Off"));
    checkbox.set("Subtype", Object::name("Widget"));
    checkbox.set("P", page_id);
    checkbox.set("AP", ap);
    let checkbox_id = doc.add_object(checkbox);
    annots.push(Object::Reference(checkbox_id));
    fields.push(Object::Reference(checkbox_id));

    if let Some(page) = doc.get_dictionary_mut(page_id) {
        page.set("Annots", annots);
    }

    let mut font = Dictionary::new();
    font.set("Type", Object::name("Font"));
    font.set("Subtype", Object::name("Type1"));
    font.set("BaseFont", Object::name("Helvetica"));
    let mut fonts = Dictionary::new();
    fonts.set("Helv", font);
    let mut resources = Dictionary::new();
    resources.set("Font", fonts);

    let mut form = Dictionary::new();
    form.set("Fields", fields);
    form.set("DR", resources);
    form.set("DA", Object::text("/Helv 0 Tf 0 g"));
    let form_id = doc.add_object(form);

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::name("Catalog"));
    catalog.set("Pages", pages_id);
    catalog.set("AcroForm", form_id);
    let root = doc.add_object(catalog);
    doc.set_root(root);
    doc
}

/// Worksheet template saved with a classic xref table
pub fn worksheet_bytes() -> Vec<u8> {
    form_document(WORKSHEET_FIELDS)
        .save_to_bytes()
        .expect("worksheet fixture")
}

/// Assessment template written the PDF 1.5 way: every object packed into a
/// compressed `/ObjStm` and indexed by a cross-reference stream
pub fn assessment_bytes() -> Vec<u8> {
    let objects = [
        (1, "<< /Type /Pages /Kids [2 0 R] /Count 1 >>"),
        (2, "<< /Type /Page /Parent 1 0 R /MediaBox [0 0 595 842] /Annots [3 0 R 4 0 R 5 0 R] >>"),
        (3, "<< /T (name) /FT /Tx /Subtype /Widget /P 2 0 R /Rect [50 700 250 720] >>"),
        (4, "<< /T (country) /FT /Tx /Subtype /Widget /P 2 0 R /Rect [50 650 250 670] >>"),
        (5, "<< /T (dob) /FT /Tx /Subtype /Widget /P 2 0 R /Rect [50 600 250 620] >>"),
        (6, "<< /Fields [3 0 R 4 0 R 5 0 R] /DA (/Helv 0 Tf 0 g) >>"),
        (7, "<< /Type /Catalog /Pages 1 0 R /AcroForm 6 0 R >>"),
    ];

    let mut header = String::new();
    let mut body = Vec::new();
    for (number, text) in objects {
        header.push_str(&format!("{number} {} ", body.len()));
        body.extend_from_slice(text.as_bytes());
        body.push(b'\n');
    }
    let mut packed = header.clone().into_bytes();
    packed.extend_from_slice(&body);
    let packed = deflate(&packed);

    let stream_number: u32 = 8;
    let xref_number: u32 = 9;
    let mut file = b"%PDF-1.5\n%\xE2\xE3\xCF\xD3\n".to_vec();

    let stream_offset = file.len();
    file.extend_from_slice(
        format!(
            "{stream_number} 0 obj\n<< /Type /ObjStm /N {} /First {} /Filter /FlateDecode /Length {} >>\nstream\n",
            objects.len(),
            header.len(),
            packed.len()
        )
        .as_bytes(),
    );
    file.extend_from_slice(&packed);
    file.extend_from_slice(b"\nendstream\nendobj\n");

    // W [1 4 2]: type, offset or object stream number, generation or index
    let xref_offset = file.len();
    let mut rows: Vec<[u8; 7]> = vec![[0, 0, 0, 0, 0, 0xFF, 0xFF]];
    for index in 0..objects.len() {
        let mut row = [2u8, 0, 0, 0, 0, 0, 0];
        row[1..5].copy_from_slice(&stream_number.to_be_bytes());
        row[5..7].copy_from_slice(&(index as u16).to_be_bytes());
        rows.push(row);
    }
    for offset in [stream_offset, xref_offset] {
        let mut row = [1u8, 0, 0, 0, 0, 0, 0];
        row[1..5].copy_from_slice(&(offset as u32).to_be_bytes());
        rows.push(row);
    }
    let table = deflate(&rows.concat());

    file.extend_from_slice(
        format!(
            "{xref_number} 0 obj\n<< /Type /XRef /Size {} /W [1 4 2] /Root 7 0 R /Filter /FlateDecode /Length {} >>\nstream\n",
            xref_number + 1,
            table.len()
        )
        .as_bytes(),
    );
    file.extend_from_slice(&table);
    file.extend_from_slice(b"\nendstream\nendobj\n");
    file.extend_from_slice(format!("startxref\n{xref_offset}\n%%EOF\n").as_bytes());
    file
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("deflate");
    encoder.finish().expect("deflate")
}

pub fn templates() -> TemplateSet {
    TemplateSet::new(
        FormTemplate::load(TemplateKind::Worksheet, &worksheet_bytes()).expect("worksheet"),
        FormTemplate::load(TemplateKind::Assessment, &assessment_bytes()).expect("assessment"),
    )
}

/// Current `/V` of the field `name`, as text
pub fn field_value(doc: &Document, name: &str) -> Option<String> {
    let fields = resolve_fields(doc).ok()?;
    let id = fields.get(name)?.node().id;
    let value = doc.get_dictionary(id)?.get("V")?;
    doc.resolve(value).as_string().map(|s| s.to_text())
}

pub fn field_names(doc: &Document) -> Vec<String> {
    resolve_fields(doc)
        .map(|fields| fields.names().map(str::to_string).collect())
        .unwrap_or_default()
}

/// One player row; empty strings become empty cells
pub struct Player<'a> {
    pub number: &'a str,
    pub class: &'a str,
    pub name: &'a str,
    pub country: &'a str,
    pub date: &'a str,
    pub competition: &'a str,
    pub dob: &'a str,
}

impl<'a> Player<'a> {
    pub fn named(name: &'a str, number: &'a str) -> Self {
        Self {
            number,
            class: "1.0",
            name,
            country: "USA",
            date: "01/02/2024",
            competition: "World Cup",
            dob: "05/10/1995",
        }
    }

    /// Cells in `REQUIRED_COLUMNS` order
    pub fn cells(&self) -> Vec<CellValue> {
        [
            self.number,
            self.class,
            self.name,
            self.country,
            self.date,
            self.competition,
            self.dob,
        ]
        .into_iter()
        .map(|text| {
            if text.is_empty() {
                CellValue::Empty
            } else {
                CellValue::from(text)
            }
        })
        .collect()
    }
}

pub fn players_sheet(name: &str, players: &[Player<'_>]) -> Sheet {
    let columns = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut sheet = Sheet::new(name, columns);
    for player in players {
        sheet.push_row(player.cells());
    }
    sheet
}

/// Open a generated archive entry as a document
pub fn archive_document(archive: &[u8], entry: &str) -> Option<Document> {
    use std::io::Read;
    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(archive)).ok()?;
    let mut file = zip.by_name(entry).ok()?;
    let mut data = Vec::new();
    file.read_to_end(&mut data).ok()?;
    Document::load(&data).ok()
}
