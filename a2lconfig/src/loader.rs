use crate::A2lError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// read a file and decode it to a String; a UTF-8 BOM is removed
pub(crate) fn load(path: &Path) -> Result<String, A2lError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(error) => {
            return Err(A2lError::FileOpenError {
                filename: path.to_path_buf(),
                ioerror: error,
            });
        }
    };

    let filedata = read_data(&mut file, path)?;
    Ok(decode_raw_bytes(&filedata))
}

fn read_data(file: &mut File, path: &Path) -> Result<Vec<u8>, A2lError> {
    let filesize = match file.metadata() {
        Ok(metadata) => metadata.len(),
        Err(err) => {
            return Err(A2lError::FileReadError {
                filename: path.to_path_buf(),
                ioerror: err,
            });
        }
    };
    let bufsize = usize::try_from(filesize).unwrap_or(usize::MAX);
    let mut buffer = Vec::with_capacity(bufsize);
    match file.read_to_end(&mut buffer) {
        Ok(_) => Ok(buffer),
        Err(err) => Err(A2lError::FileReadError {
            filename: path.to_path_buf(),
            ioerror: err,
        }),
    }
}

/// decode file data: UTF-8 if possible, otherwise ISO 8859-1
pub(crate) fn decode_raw_bytes(filedata: &[u8]) -> String {
    let filedata = filedata.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(filedata);

    if let Ok(converted) = std::str::from_utf8(filedata) {
        return converted.to_string();
    }

    /* handle the data as ISO8859-1. This always succeeds, because every sequence of bytes can be a latin-1 string */
    filedata.iter().map(|ch| char::from(*ch)).collect()
}

/*************************************************************************************************/

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn load_nonexistent_file() {
        let result = load(Path::new("file/does/not/exist"));
        assert!(matches!(result, Err(A2lError::FileOpenError { .. })));
    }

    #[test]
    fn load_file() {
        let dir = tempdir().unwrap();
        let filename = dir.path().join("bom.a2l");
        let mut file = std::fs::File::create_new(&filename).unwrap();
        file.write_all(b"\xEF\xBB\xBF/begin MEASUREMENT").unwrap();
        drop(file);

        let text = load(&filename).unwrap();
        assert_eq!(text, "/begin MEASUREMENT");
    }

    #[test]
    fn decode_utf8() {
        let data: Vec<u8> = vec![65, 66, 65, 66];
        assert_eq!(decode_raw_bytes(&data), String::from("ABAB"));
        // the BOM is removed
        let data: Vec<u8> = vec![239, 187, 191, 65, 66];
        assert_eq!(decode_raw_bytes(&data), String::from("AB"));
        let data = "°C".as_bytes();
        assert_eq!(decode_raw_bytes(data), String::from("°C"));
        assert_eq!(decode_raw_bytes(&[]), String::new());
    }

    #[test]
    fn decode_latin1() {
        let data: Vec<u8> = vec![0xa9]; // "©"
        assert_eq!(decode_raw_bytes(&data), String::from("\u{00a9}"));
        let data: Vec<u8> = vec![0xb0, b'C']; // "°C"
        assert_eq!(decode_raw_bytes(&data), String::from("°C"));
    }
}
