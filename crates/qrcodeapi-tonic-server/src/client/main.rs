//! Command-line client for the QR code gRPC service.
//!
//! ```bash
//! qrcodeapi-client version
//! qrcodeapi-client generate --content "https://example.com" --out qr.png
//! qrcodeapi-client wifi --ssid cafe --auth WPA --password secret --out wifi.svg --accept image/svg+xml
//! qrcodeapi-client contact --first-name Ada --last-name Lovelace --mobile "+44 20 7946 0000" --out ada.png
//! qrcodeapi-client vcard --file ada.vcf --out ada.png
//! qrcodeapi-client event --file launch.ics --out launch.png
//! ```

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use qrcodeapi_tonic_core::{
    proto::{self, qr_code_client::QrCodeClient},
    qrcodeapi::{
        Address, ContactCard, WifiAuth, WifiNetwork, normalize_vevent, vcard_passthrough,
    },
};
use std::path::{Path, PathBuf};
use tonic::{codec::CompressionEncoding, transport::Channel};

#[derive(Parser, Debug)]
#[command(
    name = "qrcodeapi-client",
    version,
    about = "Talks to a qrcodeapi-tonic-server"
)]
struct Cli {
    /// Server URI.
    ///
    /// Environment variable: `QRCODE_ADDR`
    #[arg(long, env = "QRCODE_ADDR", default_value = "http://127.0.0.1:8080")]
    addr: String,

    /// Compress requests and accept compressed responses with zstd.
    #[arg(long, default_value_t = false)]
    zstd: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the server version.
    Version,
    /// Render arbitrary text or a URL.
    Generate {
        /// Text to encode.
        #[arg(long, conflicts_with = "url")]
        content: Option<String>,
        /// URL to encode (sent with the `URLTO:` prefix).
        #[arg(long)]
        url: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Render a Wi-Fi network-join code.
    Wifi {
        #[arg(long)]
        ssid: String,
        /// WEP, WPA or WPA2. Anything else is an open network.
        #[arg(long, default_value = "")]
        auth: String,
        #[arg(long, default_value = "")]
        password: String,
        #[arg(long)]
        hidden: Option<bool>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Render a vCard 4.0 contact built from the given fields.
    Contact {
        #[command(flatten)]
        card: ContactArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Render an existing vCard file.
    Vcard {
        #[arg(long)]
        file: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Render an iCalendar VEVENT file.
    Event {
        #[arg(long)]
        file: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
struct ContactArgs {
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
    #[arg(long, default_value = "")]
    middle_name: String,
    #[arg(long, default_value = "")]
    organization: String,
    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    work_email: String,
    #[arg(long, default_value = "")]
    mobile: String,
    #[arg(long, default_value = "")]
    tel: String,
    #[arg(long, default_value = "")]
    street: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    post_code: String,
    #[arg(long, default_value = "")]
    country: String,
    #[arg(long, default_value = "")]
    url: String,
    #[arg(long, default_value = "")]
    note: String,
}

impl From<ContactArgs> for ContactCard {
    fn from(args: ContactArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            middle_name: args.middle_name,
            organization: args.organization,
            title: args.title,
            home_email: args.email,
            work_email: args.work_email,
            mobile: args.mobile,
            tel: args.tel,
            home_address: Address {
                street: args.street,
                city: args.city,
                post_code: args.post_code,
                country: args.country,
                ..Default::default()
            },
            url: args.url,
            note: args.note,
            ..Default::default()
        }
    }
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Target width in pixels (0 uses the server default).
    #[arg(long, default_value_t = 0)]
    width: i32,
    /// Target height in pixels (0 uses the server default).
    #[arg(long, default_value_t = 0)]
    height: i32,
    /// Preferred formats, e.g. "image/webp, image/png".
    #[arg(long, default_value = "image/png")]
    accept: String,
    /// File to write the image to.
    #[arg(long)]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let channel = Channel::from_shared(cli.addr.clone())
        .with_context(|| format!("invalid server address {}", cli.addr))?
        .connect()
        .await
        .with_context(|| format!("failed to connect to {}", cli.addr))?;
    let mut client = QrCodeClient::new(channel);
    if cli.zstd {
        client = client
            .send_compressed(CompressionEncoding::Zstd)
            .accept_compressed(CompressionEncoding::Zstd);
    }

    match cli.command {
        Command::Version => {
            let version = client.version(()).await?.into_inner();
            println!("{version}");
        }
        Command::Generate {
            content,
            url,
            output,
        } => {
            let request = build_request(
                content.unwrap_or_default(),
                url.unwrap_or_default(),
                &output,
            );
            write_image(&mut client, request, &output).await?;
        }
        Command::Wifi {
            ssid,
            auth,
            password,
            hidden,
            output,
        } => {
            let network = WifiNetwork {
                ssid,
                auth: WifiAuth::parse(&auth),
                password,
                hidden,
                ..Default::default()
            };
            let request = build_request(network.to_payload(), String::new(), &output);
            write_image(&mut client, request, &output).await?;
        }
        Command::Contact { card, output } => {
            let payload = ContactCard::from(card).to_payload();
            let request = build_request(payload, String::new(), &output);
            write_image(&mut client, request, &output).await?;
        }
        Command::Vcard { file, output } => {
            let raw = read_text(&file).await?;
            let payload = vcard_passthrough(&raw)
                .with_context(|| format!("{} is not a vCard", file.display()))?;
            let request = build_request(payload, String::new(), &output);
            write_image(&mut client, request, &output).await?;
        }
        Command::Event { file, output } => {
            let payload = normalize_vevent(&read_text(&file).await?);
            let request = build_request(payload, String::new(), &output);
            write_image(&mut client, request, &output).await?;
        }
    }

    Ok(())
}

fn build_request(content: String, url: String, output: &OutputArgs) -> proto::Request {
    proto::Request {
        content,
        url,
        width: output.width,
        height: output.height,
        accept: output.accept.clone(),
    }
}

async fn read_text(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

async fn write_image(
    client: &mut QrCodeClient<Channel>,
    request: proto::Request,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let response = client.generate(request).await?.into_inner();
    tokio::fs::write(&output.out, &response.image)
        .await
        .with_context(|| format!("failed to write {}", output.out.display()))?;

    println!(
        "{} {}x{} ({} bytes) -> {}",
        response.content_type,
        response.width,
        response.height,
        response.image.len(),
        output.out.display()
    );
    Ok(())
}
