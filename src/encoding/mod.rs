/*!
 * Character encoding detection and decoding.
 *
 * - `sniffer`: statistical classification of byte samples into canonical encodings
 * - `decoder`: per-line decoding of files that mix several encodings
 * - `script`: detection of CJK ideographs in decoded text
 */

pub mod decoder;
pub mod script;
pub mod sniffer;

pub use self::decoder::MixedEncodingDecoder;
pub use self::script::{contains_cjk, needs_translation};
pub use self::sniffer::{Detection, EncodingName, LineClassifier, StatisticalSniffer, sniff_file};
