//! Information element scanning
//!
//! Elements are `tag (1) | length (1) | value (length)` triples packed
//! back-to-back. [`Elements`] walks them lazily and stops at the first element
//! whose declared length runs past the buffer; nothing outside the buffer is
//! ever read.

/// SSID element
pub const TAG_SSID: u8 = 0x00;
/// Supported rates element
pub const TAG_SUPPORTED_RATES: u8 = 0x01;
/// DS parameter set (current channel)
pub const TAG_DS_PARAMS: u8 = 0x03;
/// RSN element
pub const TAG_RSN: u8 = 0x30;
/// Vendor-specific element used by pwngrid advertisements
pub const TAG_PWNGRID: u8 = 0xDE;

/// Longest value an element can carry
pub const MAX_ELEMENT_LEN: usize = 255;

/// Longest SSID allowed by 802.11
pub const MAX_SSID_LEN: usize = 32;

/// One borrowed element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InformationElement<'a> {
    pub tag: u8,
    pub value: &'a [u8],
}

/// Lazy element iterator
#[derive(Debug, Clone)]
pub struct Elements<'a> {
    buf: &'a [u8],
    pos: usize,
    malformed: bool,
}

impl<'a> Elements<'a> {
    /// Scan `buf` starting at `offset`. An offset past the end yields nothing.
    pub fn new(buf: &'a [u8], offset: usize) -> Self {
        Self {
            buf,
            pos: offset,
            malformed: false,
        }
    }

    /// Did the scan stop on an element that overran the buffer?
    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    /// First element carrying `tag`
    pub fn find_tag(mut self, tag: u8) -> Option<InformationElement<'a>> {
        self.find(|e| e.tag == tag)
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = InformationElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.malformed || self.pos + 2 > self.buf.len() {
            return None;
        }

        let tag = self.buf[self.pos];
        let len = self.buf[self.pos + 1] as usize;
        let start = self.pos + 2;
        let end = start + len;

        if end > self.buf.len() {
            self.malformed = true;
            return None;
        }

        self.pos = end;
        Some(InformationElement {
            tag,
            value: &self.buf[start..end],
        })
    }
}

/// SSID carried by the first SSID element, lossily decoded
pub fn ssid(elements: Elements<'_>) -> Option<String> {
    elements
        .find_tag(TAG_SSID)
        .map(|e| String::from_utf8_lossy(e.value).into_owned())
}

/// Is the SSID empty or made only of NUL bytes (a hidden network)?
pub fn is_hidden_ssid(value: &[u8]) -> bool {
    value.iter().all(|&b| b == 0)
}

/// Replace every byte outside printable ASCII with `?`
pub fn sanitize_ascii(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .map(|&b| if (0x20..0x7F).contains(&b) { b } else { b'?' })
        .collect()
}
