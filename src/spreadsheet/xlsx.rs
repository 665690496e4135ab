use crate::error::SheetMapperError;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::excel::SheetEntries;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::reference::MAX_COLS;
use crate::spreadsheet::reference::MAX_ROWS;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use log::debug;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use std::io::Cursor;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_FORMULA: QName = QName(b"f");               // Formula of a cell
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cell value content

/// An opened Excel XLSX container held in memory
pub(crate) struct XlsxSpreadsheet {
    /// ZIP archive containing the XLSX parts
    zip: ZipArchive<Cursor<Vec<u8>>>,
    /// Parsed number formats for cell type detection, indexed by style id
    number_formats: Vec<CellType>,
    /// List of worksheets with (name, zip_path) pairs
    sheets: SheetEntries,
    /// Whether the workbook uses the 1904 date system
    is_1904: bool,
}

impl XlsxSpreadsheet {
    /// Opens an XLSX container from its bytes and parses the workbook structure
    pub(crate) fn open(bytes: Vec<u8>) -> Result<XlsxSpreadsheet, SheetMapperError> {
        let (zip, number_formats, sheets, is_1904) = excel::open(Cursor::new(bytes), load_workbook, load_number_formats)?;
        Ok(XlsxSpreadsheet {
            zip,
            number_formats,
            sheets,
            is_1904,
        })
    }

    /// Loads every string of the shared string table, in table order.
    ///
    /// Shared strings are stored in a separate part and referenced by index
    /// to reduce file size when the same string appears multiple times.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, SheetMapperError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader("xl/sharedStrings.xml")? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };

        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
                shared_strings.push(string);
            }
        });
        Ok(shared_strings)
    }

    /// Reads every worksheet of the container into memory.
    ///
    /// Rows are created as soon as their `<row>` element is seen, so a row
    /// without any value still exists in the resulting sheet. Cells without a
    /// value become [`CellType::Empty`] cells.
    pub(crate) fn read_sheets(&mut self) -> Result<Vec<Sheet>, SheetMapperError> {
        let shared_strings = self.load_shared_strings()?;
        let mut sheets = Vec::<Sheet>::with_capacity(self.sheets.len());
        for (sheet_name, zip_path) in &self.sheets {
            let mut sheet = Sheet::new(sheet_name, self.is_1904);
            let mut row_count = 0usize;
            let mut col_count = 0usize;
            let mut row = 0usize;
            let mut col = 0usize;
            let mut in_cell = false;
            let mut is_shared = false;
            let mut has_formula = false;
            let mut kind = CellType::default();
            let mut value = String::new();
            let mut reader = self.zip.xml_reader(zip_path)?
                .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;
            match_xml_events!(reader => {
                Event::Start(event) if event.name() == TAG_ROW => {
                    row_count = event.parse_attribute_value::<usize>("r")?
                        .and_then(|index| index.checked_sub(1))
                        .unwrap_or(row_count);
                    check_bounds(row_count, 0)?;
                    col_count = 0;
                    sheet.touch_row(row_count);
                }
                Event::End(event) if event.name() == TAG_ROW => {
                    row_count += 1;
                }
                Event::Start(event) if event.name() == TAG_CELL => {
                    (row, col) = event.get_attribute_value("r")?
                        .and_then(|reference| reference_to_index(&reference))
                        .unwrap_or((row_count, col_count));
                    check_bounds(row, col)?;
                    col_count = col + 1;
                    in_cell = true;
                    is_shared = false;
                    has_formula = false;
                    value.clear();
                    kind = event.get_attribute_value("t")?.map(|t| {
                        match t.as_ref() {
                            "inlineStr" => CellType::Text,
                            "s" => {
                                is_shared = true;
                                CellType::Text
                            }
                            "str" => CellType::Formula,
                            "d" => CellType::IsoDateTime,
                            "b" => CellType::Boolean,
                            "e" => CellType::Error,
                            _ => CellType::Number,
                        }
                    }).unwrap_or(CellType::Number);
                    if kind == CellType::Number {
                        if let Some(index) = event.parse_attribute_value::<usize>("s")? {
                            kind = self.number_formats.get(index).copied().unwrap_or(CellType::Number);
                        }
                    }
                }
                Event::Start(event) if in_cell && event.name() == TAG_FORMULA => {
                    has_formula = true;
                }
                Event::Start(event) if in_cell && event.name() == TAG_INLINE_STRING => {
                    value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
                }
                Event::Start(event) if in_cell && event.name() == TAG_VALUE => {
                    value = read_string_value(&mut reader, TAG_VALUE, true)?;
                }
                Event::End(event) if in_cell && event.name() == TAG_CELL => {
                    in_cell = false;
                    let is_missing = value.is_empty();
                    if is_shared && !is_missing {
                        let index = value.trim().parse::<usize>()?;
                        value = shared_strings
                            .get(index)
                            .cloned()
                            .ok_or_else(|| SpreadsheetError::FileError(format!("xl/sharedStrings.xml#{index}")))?;
                    }
                    if has_formula {
                        kind = CellType::Formula;
                    } else if is_missing && (is_shared || kind != CellType::Text) {
                        kind = CellType::Empty;
                    }
                    sheet.set_cell(row, col, kind, std::mem::take(&mut value));
                }
            });
            debug!("Loaded sheet '{}' with {} rows", sheet.name(), sheet.rows().count());
            sheets.push(sheet);
        }

        Ok(sheets)
    }
}

/// Rejects positions beyond the worksheet limits of the format.
fn check_bounds(row: usize, col: usize) -> Result<(), SpreadsheetError> {
    if row >= MAX_ROWS || col >= MAX_COLS {
        Err(SpreadsheetError::CellOutOfBounds(index_to_reference(row, col)))
    } else {
        Ok(())
    }
}

/// Loads workbook structure and worksheet information from XLSX file
///
/// Parses the workbook.xml file to extract worksheet names and their corresponding
/// XML file paths, and determines the date system (1900 vs 1904) used in the file.
fn load_workbook(zip: &mut ZipArchive<Cursor<Vec<u8>>>) -> Result<(SheetEntries, bool), SheetMapperError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: SheetEntries = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads number formats and cell styles from XLSX styles.xml file
///
/// Parses custom number formats and cell style indexes to determine
/// how numeric values should be interpreted (dates, times or plain numbers).
fn load_number_formats(zip: &mut ZipArchive<Cursor<Vec<u8>>>, is_1904: bool) -> Result<Vec<CellType>, SheetMapperError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();

    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                let style = CellType::parse_custom_number_format(&format, is_1904);
                custom_formats.insert(id.to_string(), style);
            }
        }

        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEXES => break,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?.unwrap_or(Cow::Borrowed("0"));
            format_indexes.push(id.to_string());
        }
    });

    Ok(excel::load_number_formats(format_indexes, custom_formats, is_1904))
}

/// Reads string value from XML content, handling text and CDATA sections
///
/// Extracts string content from XML elements, skipping phonetic text annotations
/// and properly handling both text nodes and CDATA sections.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, SheetMapperError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
