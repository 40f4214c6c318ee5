use quick_xml::events::Event;
use quick_xml::Reader;

/// Extract the `href` of every anchor element in the document, in document
/// order. No normalization is applied; relative links come back as written.
/// Directory listings are not always well-formed markup, so a tokenizer error
/// ends the scan with whatever was collected so far, the same way end of
/// input does. Zero anchors is an empty result, not an error.
pub fn extract_links(html: &str) -> Vec<String> {
    let mut reader = Reader::from_str(html);
    reader.config_mut().check_end_names = false;

    let mut links = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.name().as_ref().eq_ignore_ascii_case(b"a") =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref().eq_ignore_ascii_case(b"href") {
                        if let Ok(href) = attr.unescape_value() {
                            links.push(href.into_owned());
                        }
                        break;
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    links
}
