use crate::error::{Result, VkError};
use crate::params::{validate_params, Params};
use crate::query::encode_query;
use crate::response::ResponseFormat;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder};
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use url::Url;

/// Multipart field name of the uploaded file
pub const FILE_FIELD: &str = "file1";

const FILE_MIME: &str = "application/octet-stream";

/// Bytes read from a stream source before the request is sent
const PEEK_SIZE: usize = 8192;

/// Source of the file carried by an upload request
pub enum FileSource {
    /// File on the local filesystem, opened when the request is built
    Path(PathBuf),
    /// Any byte stream, drained into the request body as it is sent.
    /// The first chunk is read when the request is built, so a stream that
    /// cannot be read at all fails before any network I/O.
    Reader {
        file_name: String,
        reader: Box<dyn Read + Send>,
    },
    /// In-memory file content
    Bytes { file_name: String, data: Vec<u8> },
}

impl FileSource {
    /// Upload the file at `path`; the part is named after the file
    pub fn path(path: impl Into<PathBuf>) -> Self {
        FileSource::Path(path.into())
    }

    /// Upload the content of `reader` under the given file name
    pub fn reader<R>(file_name: impl Into<String>, reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        FileSource::Reader {
            file_name: file_name.into(),
            reader: Box::new(reader),
        }
    }

    /// Upload an in-memory buffer under the given file name
    pub fn bytes(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        FileSource::Bytes {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    /// Turn the source into the multipart file part. Opening a path happens
    /// here, so a missing file fails before any network I/O.
    fn into_part(self) -> Result<Part> {
        let part = match self {
            FileSource::Path(path) => {
                let (file, len) = open_upload_file(&path)?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Part::reader_with_length(file, len).file_name(file_name)
            }
            FileSource::Reader { file_name, reader } => {
                let reader = peek_stream(&file_name, reader)?;
                Part::reader(reader).file_name(file_name)
            }
            FileSource::Bytes { file_name, data } => Part::bytes(data).file_name(file_name),
        };

        part.mime_str(FILE_MIME)
            .map_err(|e| VkError::Encoding(format!("invalid file part: {}", e)))
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            FileSource::Reader { file_name, .. } => f
                .debug_struct("Reader")
                .field("file_name", file_name)
                .finish_non_exhaustive(),
            FileSource::Bytes { file_name, data } => f
                .debug_struct("Bytes")
                .field("file_name", file_name)
                .field("len", &data.len())
                .finish(),
        }
    }
}

fn open_upload_file(path: &Path) -> Result<(File, u64)> {
    let access = |source| VkError::FileAccess {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(access)?;
    let metadata = file.metadata().map_err(access)?;
    if !metadata.is_file() {
        return Err(access(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    Ok((file, metadata.len()))
}

/// Read the first chunk of a stream and put it back in front of the rest
fn peek_stream(file_name: &str, mut reader: Box<dyn Read + Send>) -> Result<impl Read + Send> {
    let mut head = vec![0u8; PEEK_SIZE];
    let n = loop {
        match reader.read(&mut head) {
            Ok(n) => break n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(VkError::FileAccess {
                    path: PathBuf::from(file_name),
                    source,
                })
            }
        }
    };
    head.truncate(n);
    Ok(Cursor::new(head).chain(reader))
}

/// Body of an outgoing request
#[derive(Debug)]
pub enum RequestBody {
    /// Plain GET, everything is in the query string
    None,
    /// Multipart POST with text fields only
    Form(Params),
    /// Multipart POST with one file part plus text fields
    Upload { file: FileSource, fields: Params },
}

/// One outgoing call: the complete target URL and what to send with it
#[derive(Debug)]
pub struct RequestIntent {
    pub url: String,
    pub body: RequestBody,
}

impl RequestIntent {
    pub fn get(url: impl Into<String>) -> Self {
        RequestIntent {
            url: url.into(),
            body: RequestBody::None,
        }
    }

    pub fn form(url: impl Into<String>, fields: Params) -> Self {
        RequestIntent {
            url: url.into(),
            body: RequestBody::Form(fields),
        }
    }

    pub fn upload(url: impl Into<String>, file: FileSource, fields: Params) -> Self {
        RequestIntent {
            url: url.into(),
            body: RequestBody::Upload { file, fields },
        }
    }

    /// HTTP method this intent is sent with
    pub fn method(&self) -> &'static str {
        match self.body {
            RequestBody::None => "GET",
            RequestBody::Form(_) | RequestBody::Upload { .. } => "POST",
        }
    }

    /// Build the HTTP request. Fails without touching the network when the
    /// URL is invalid or the upload file cannot be opened.
    pub fn build(self, client: &Client) -> Result<RequestBuilder> {
        let url = Url::parse(&self.url)
            .map_err(|e| VkError::Encoding(format!("invalid URL {:?}: {}", self.url, e)))?;

        let request = match self.body {
            RequestBody::None => client.get(url),
            RequestBody::Form(fields) => client.post(url).multipart(build_form(None, &fields)?),
            RequestBody::Upload { file, fields } => {
                client.post(url).multipart(build_form(Some(file), &fields)?)
            }
        };
        Ok(request)
    }
}

/// Assemble a multipart form: the file part first (if any), then one text
/// field per parameter. The boundary is chosen by the form and carried into
/// the request's content-type header by `RequestBuilder::multipart`.
pub fn build_form(file: Option<FileSource>, fields: &Params) -> Result<Form> {
    validate_params(fields)?;
    let mut form = Form::new();
    if let Some(file) = file {
        form = form.part(FILE_FIELD, file.into_part()?);
    }
    for (key, value) in fields {
        form = form.text(key.clone(), value.to_string());
    }
    Ok(form)
}

/// Unsigned API path for a method call, e.g. `/method/users.get?user_ids=1`.
/// The query separator is always present so the signature input matches
/// what the API recomputes.
pub fn method_path(method: &str, format: ResponseFormat, params: &Params) -> String {
    format!(
        "/method/{}{}?{}",
        method,
        format.method_suffix(),
        encode_query(params)
    )
}
