//! Decodes rendered images with an independent QR reader.

use qrcodeapi::{
    Address, ContactCard, EcLevel, GenerationRequest, Limits, OutputFormat, URL_PREFIX, WifiAuth,
    WifiNetwork, encode, generate, normalize_vevent, render_as, vcard_passthrough,
};

fn decode_png(bytes: &[u8]) -> String {
    let img = image::load_from_memory(bytes).unwrap().into_luma8();
    decode_luma(&img)
}

fn decode_luma(img: &image::GrayImage) -> String {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        img.width() as usize,
        img.height() as usize,
        |x, y| img.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one symbol");
    let (_meta, content) = grids[0].decode().unwrap();
    content
}

/// Four pixels per module, quiet zone included.
fn comfortable_side(matrix: &qrcodeapi::QrMatrix) -> u32 {
    ((matrix.size() + 2 * qrcodeapi::QUIET_ZONE) * 4) as u32
}

fn generate_png(content: &str, width: i32, height: i32) -> String {
    let req = GenerationRequest {
        content: content.into(),
        width,
        height,
        accept: "image/png".into(),
        ..Default::default()
    };
    let response = generate(&req, &Limits::default()).unwrap();
    assert_eq!(response.content_type, "image/png");
    decode_png(&response.image)
}

#[test]
fn example_url_round_trips() {
    let req = GenerationRequest {
        content: "https://example.com".into(),
        width: 200,
        height: 200,
        accept: "image/png".into(),
        ..Default::default()
    };
    let response = generate(&req, &Limits::default()).unwrap();
    assert_eq!(response.content_type, "image/png");
    assert_eq!((response.width, response.height), (200, 200));
    assert_eq!(decode_png(&response.image), "https://example.com");
}

#[test]
fn url_field_round_trips_with_prefix() {
    let req = GenerationRequest {
        url: "https://example.com/a?b=c".into(),
        width: 300,
        height: 300,
        ..Default::default()
    };
    let response = generate(&req, &Limits::default()).unwrap();
    assert_eq!(
        decode_png(&response.image),
        format!("{URL_PREFIX}https://example.com/a?b=c")
    );
}

#[test]
fn every_mode_round_trips() {
    for content in ["0123456789012345", "HELLO WORLD $%*+-./:", "mixed Case & ünïcode"] {
        assert_eq!(generate_png(content, 256, 256), content);
    }
}

#[test]
fn non_square_box_round_trips() {
    assert_eq!(generate_png("wide", 600, 150), "wide");
    assert_eq!(generate_png("tall", 120, 480), "tall");
}

#[test]
fn versions_with_alignment_and_version_blocks_round_trip() {
    // Byte payloads landing on versions 2, 7 and 15 at Medium.
    for len in [20, 120, 400] {
        let content: String = (0..len).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let matrix = encode(&content).unwrap();
        let side = comfortable_side(&matrix);
        let rendered = render_as(&matrix, side, side, OutputFormat::Png).unwrap();
        assert_eq!(decode_png(&rendered.bytes), content, "version {:?}", matrix.version());
    }
}

#[test]
fn low_level_fallback_round_trips() {
    let content = "z".repeat(2400);
    let matrix = encode(&content).unwrap();
    assert_eq!(matrix.ec_level(), EcLevel::Low);
    let side = comfortable_side(&matrix);
    let rendered = render_as(&matrix, side, side, OutputFormat::Png).unwrap();
    assert_eq!(decode_png(&rendered.bytes), content);
}

#[test]
fn lossless_formats_round_trip() {
    let matrix = encode("lossless").unwrap();
    for format in [OutputFormat::Gif, OutputFormat::WebP] {
        let rendered = render_as(&matrix, 200, 200, format).unwrap();
        let img = image::load_from_memory(&rendered.bytes).unwrap().into_luma8();
        assert_eq!(decode_luma(&img), "lossless", "{format}");
    }
}

#[test]
fn wifi_payload_round_trips() {
    let network = WifiNetwork {
        ssid: "Home;Net".into(),
        auth: WifiAuth::Wpa2,
        password: "p@ss:word".into(),
        ..Default::default()
    };
    let payload = network.to_payload();
    assert_eq!(generate_png(&payload, 300, 300), payload);
}

#[test]
fn contact_card_round_trips() {
    let card = ContactCard {
        last_name: "Lovelace".into(),
        first_name: "Ada".into(),
        organization: "Analytical Engines".into(),
        home_email: "ada@example.com".into(),
        mobile: "+44 20 7946 0000".into(),
        home_address: Address {
            street: "12 St James's Square".into(),
            city: "London".into(),
            country: "UK".into(),
            ..Default::default()
        },
        note: "first programmer".into(),
        ..Default::default()
    };
    let payload = card.to_payload();
    assert_eq!(generate_png(&payload, 600, 600), payload);
}

#[test]
fn raw_calendar_and_contact_payloads_round_trip() {
    let event =
        normalize_vevent("BEGIN:VEVENT\nSUMMARY:Launch\nDTSTART:20260101T090000Z\nEND:VEVENT");
    assert_eq!(generate_png(&event, 400, 400), event);

    let card = vcard_passthrough("BEGIN:VCARD\nVERSION:4.0\nFN:Ada\nEND:VCARD\n").unwrap();
    assert_eq!(generate_png(&card, 400, 400), card);
}
