use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object};
use crate::parser::filters;

#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    dictionary: Dictionary,
    data: Vec<u8>,
}

impl Stream {
    /// Stream with the raw (still encoded) data as stored in the file.
    pub fn new(dictionary: Dictionary, data: Vec<u8>) -> Self {
        Self { dictionary, data }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dictionary
    }

    /// Raw data, with filters still applied.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Data with every filter in `/Filter` undone.
    pub fn decoded_data(&self) -> Result<Vec<u8>> {
        filters::decode_stream(&self.data, &self.dictionary).map_err(PdfError::from)
    }

    /// Compresses the data with FlateDecode and records the filter.
    pub fn compress_flate(&mut self) -> Result<()> {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&self.data)
            .map_err(|e| PdfError::CompressionError(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| PdfError::CompressionError(e.to_string()))?;

        self.data = compressed;
        self.dictionary.set("Length", self.data.len() as i64);
        self.dictionary.set("Filter", Object::name("FlateDecode"));

        Ok(())
    }
}
