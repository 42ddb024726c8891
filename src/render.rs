// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Document Rendering
//!
//! The printable PDF is laid out client-side. The server supplies the
//! certificate-shaped payload together with the public verification URL and
//! a QR code for it, and renders the read-only HTML pages served at
//! `/verify/{id}` and `/download/{id}`.

use std::fmt::Write as _;

use qrcode::render::svg;
use qrcode::QrCode;

use crate::models::{CertificatePayload, DownloadCertificateResponse, PortfolioBalance};
use crate::storage::Certificate;

pub const COMPANY_NAME: &str = "WalletScan";
pub const COMPANY_URL: &str = "wallet-scan.io";
pub const SUPPORT_EMAIL: &str = "support@walletscan.io";

pub const DISCLAIMER: &str = "This certificate represents a snapshot of verified cryptocurrency holdings at the time of generation. Cryptocurrency values fluctuate and this document does not constitute financial advice. The holder maintains full custody of all assets. This certificate is for informational purposes only.";

pub const VERIFICATIONS: [&str; 4] = [
    "Blockchain data verified",
    "Wallet ownership confirmed",
    "Real-time balance snapshot",
    "Cryptographically secured",
];

const QR_MIN_SIZE: u32 = 160;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("QR encoding failed: {0}")]
    Qr(String),
}

/// Public verification page for a certificate.
pub fn verification_url(origin: &str, certificate_id: &str) -> String {
    format!("{}/verify/{}", origin.trim_end_matches('/'), certificate_id)
}

/// Encode `data` as a standalone SVG QR code.
pub fn qr_svg(data: &str) -> Result<String, RenderError> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| RenderError::Qr(e.to_string()))?;
    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .quiet_zone(true)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

/// Payload handed to the client-side PDF renderer.
pub fn download_payload(
    certificate: &Certificate,
    origin: &str,
) -> Result<DownloadCertificateResponse, RenderError> {
    let verification_url = verification_url(origin, &certificate.certificate_id);
    let qr_code_svg = qr_svg(&verification_url)?;

    Ok(DownloadCertificateResponse {
        success: true,
        certificate: CertificatePayload::from(certificate),
        verification_url,
        qr_code_svg,
    })
}

// =============================================================================
// HTML Pages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Read-only verification view.
    Verify,
    /// Same document, opening the print dialog once loaded.
    Download,
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `$1,234.56`
pub fn format_usd(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let dollars = cents / 100;
    let digits = dollars.to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

/// Token amount with up to four decimals and no trailing zeros.
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{amount:.4}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

const PAGE_STYLE: &str = "body{font-family:system-ui,-apple-system,sans-serif;background:#f4f6fb;color:#1a202c;margin:0;padding:32px}\
main{max-width:820px;margin:0 auto}\
.badge{background:#e6f7ee;border:1px solid #34a853;border-radius:8px;padding:16px 20px;margin-bottom:24px}\
.badge h2{margin:0 0 4px;color:#1e7e44}\
.certificate{background:#fff;border-radius:12px;padding:32px;box-shadow:0 2px 12px rgba(0,0,0,.08)}\
.header{display:flex;justify-content:space-between;align-items:flex-start;gap:24px}\
.mono{font-family:ui-monospace,monospace;word-break:break-all}\
table{width:100%;border-collapse:collapse;margin:16px 0}\
th,td{text-align:left;padding:8px;border-bottom:1px solid #e2e8f0}\
td.num,th.num{text-align:right}\
.total{font-size:1.6em;font-weight:700}\
.verifications li{list-style:none}\
.verifications li::before{content:'\\2713 ';color:#34a853}\
.disclaimer,.note{font-size:.85em;color:#4a5568}\
@media print{body{background:#fff;padding:0}.badge,.note{display:none}.certificate{box-shadow:none}}";

fn write_balance_rows(out: &mut String, balances: &[PortfolioBalance]) {
    if balances.is_empty() {
        out.push_str("<tr><td colspan=\"4\">No holdings</td></tr>");
        return;
    }
    for balance in balances {
        let _ = write!(
            out,
            "<tr><td>{token} <small>({symbol})</small></td><td>{chain}</td>\
             <td class=\"num\">{amount}</td><td class=\"num\">{value}</td></tr>",
            token = escape_html(&balance.token),
            symbol = escape_html(&balance.symbol),
            chain = escape_html(&balance.chain),
            amount = format_amount(balance.amount),
            value = format_usd(balance.value),
        );
    }
}

/// Render a certificate as a standalone HTML document.
pub fn render_certificate_page(
    certificate: &Certificate,
    verification_url: &str,
    qr_svg: &str,
    mode: PageMode,
) -> String {
    let id = escape_html(&certificate.certificate_id);
    let mut html = String::with_capacity(8 * 1024);

    let _ = write!(
        html,
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{COMPANY_NAME} Proof of Funds {id}</title><style>{PAGE_STYLE}</style></head><body><main>"
    );

    html.push_str(
        "<section class=\"badge\"><h2>&#10003; Certificate Verified Successfully</h2>\
         <p>This certificate has been verified on the blockchain and is authentic.</p></section>",
    );

    let _ = write!(
        html,
        "<article class=\"certificate\"><div class=\"header\"><div>\
         <h1>Proof of Funds Certificate</h1>\
         <p>Issued by <strong>{COMPANY_NAME}</strong> &middot; {COMPANY_URL}</p>\
         <p>Certificate ID: <span class=\"mono\">{id}</span></p>\
         <p>Issue date: {issue}</p><p>Verified: {verified}</p></div>\
         <div class=\"qr\">{qr_svg}</div></div>",
        issue = escape_html(&certificate.issue_date),
        verified = escape_html(&certificate.verification_date),
    );

    let _ = write!(
        html,
        "<h3>Holder</h3><p>{holder}</p>\
         <h3>Wallet address</h3><p class=\"mono\">{wallet}</p>\
         <h3>Total verified value</h3><p class=\"total\">{total}</p>",
        holder = escape_html(&certificate.holder_name),
        wallet = escape_html(&certificate.wallet_address),
        total = format_usd(certificate.total_value),
    );

    html.push_str(
        "<table><thead><tr><th>Asset</th><th>Chain</th>\
         <th class=\"num\">Amount</th><th class=\"num\">Value (USD)</th></tr></thead><tbody>",
    );
    write_balance_rows(&mut html, &certificate.balances);
    html.push_str("</tbody></table>");

    html.push_str("<ul class=\"verifications\">");
    for item in VERIFICATIONS {
        let _ = write!(html, "<li>{item}</li>");
    }
    html.push_str("</ul>");

    let _ = write!(
        html,
        "<p>Certificate hash: <span class=\"mono\">{hash}</span></p>\
         <p>Verify at: <a href=\"{url}\">{url}</a></p>\
         <p class=\"disclaimer\">{DISCLAIMER}</p>\
         <p class=\"disclaimer\">Questions? Contact {SUPPORT_EMAIL}</p></article>",
        hash = escape_html(&certificate.certificate_hash),
        url = escape_html(verification_url),
    );

    html.push_str(
        "<section class=\"note\"><h3>About This Verification</h3>\
         <p>This page displays a verified proof of funds certificate. The wallet address and \
         holdings have been verified on the blockchain. Note that the holder name is \
         self-reported and not verified. Always conduct your own due diligence.</p></section>",
    );

    if mode == PageMode::Download {
        html.push_str("<script>window.addEventListener('load',function(){window.print();});</script>");
    }

    html.push_str("</main></body></html>");
    html
}

/// Page served for an unknown certificate id.
pub fn render_not_found_page(certificate_id: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>Certificate not found</title><style>{PAGE_STYLE}</style></head><body><main>\
         <article class=\"certificate\"><h1>Certificate not found</h1>\
         <p>No certificate exists with ID <span class=\"mono\">{id}</span>.</p>\
         <p><a href=\"/\">Return Home</a></p></article></main></body></html>",
        id = escape_html(certificate_id),
    )
}

/// Page served when a certificate exists or may exist but cannot be shown.
pub fn render_unavailable_page() -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>Certificate unavailable</title><style>{PAGE_STYLE}</style></head><body><main>\
         <article class=\"certificate\"><h1>Unable to load certificate</h1>\
         <p>Something went wrong on our side. Please try again later or contact \
         {SUPPORT_EMAIL}.</p>\
         <p><a href=\"/\">Return Home</a></p></article></main></body></html>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn certificate() -> Certificate {
        Certificate {
            certificate_id: "CP-11680123".into(),
            wallet_address: "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12".into(),
            holder_name: "<script>alert(1)</script>".into(),
            total_value: 1234567.891,
            balances: vec![PortfolioBalance {
                token: "Ether".into(),
                symbol: "ETH".into(),
                amount: 1.5,
                value: 4500.0,
                chain: "Ethereum".into(),
                address: "0x0000000000000000000000000000000000000000".into(),
                img_url: None,
            }],
            issue_date: "October 16, 2026".into(),
            verification_date: "10/16/2026, 10:48:00 AM".into(),
            certificate_hash: "0xba7816bf8f01cfea...".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn verification_url_joins_origin_and_id() {
        assert_eq!(
            verification_url("https://wallet-scan.io/", "CP-1"),
            "https://wallet-scan.io/verify/CP-1"
        );
    }

    #[test]
    fn qr_svg_is_an_svg_document() {
        let svg = qr_svg("https://wallet-scan.io/verify/CP-11680123").unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#000000"));
    }

    #[test]
    fn download_payload_links_certificate() {
        let cert = certificate();
        let payload = download_payload(&cert, "http://localhost:3000").unwrap();
        assert!(payload.success);
        assert_eq!(
            payload.verification_url,
            "http://localhost:3000/verify/CP-11680123"
        );
        assert_eq!(payload.certificate.certificate_hash, cert.certificate_hash);
        assert!(payload.qr_code_svg.contains("<svg"));
    }

    #[test]
    fn usd_and_amount_formatting() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(999.5), "$999.50");
        assert_eq!(format_usd(1234567.891), "$1,234,567.89");
        assert_eq!(format_amount(1.5), "1.5");
        assert_eq!(format_amount(2.0), "2");
        assert_eq!(format_amount(0.00001), "0");
    }

    #[test]
    fn page_escapes_user_supplied_text() {
        let page = render_certificate_page(
            &certificate(),
            "https://wallet-scan.io/verify/CP-11680123",
            "<svg></svg>",
            PageMode::Verify,
        );
        assert!(!page.contains("<script>alert(1)</script>"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(page.contains("$1,234,567.89"));
        assert!(page.contains(DISCLAIMER));
        assert!(!page.contains("window.print"));
    }

    #[test]
    fn download_page_triggers_print() {
        let page = render_certificate_page(&certificate(), "u", "<svg></svg>", PageMode::Download);
        assert!(page.contains("window.print"));
    }

    #[test]
    fn unavailable_page_does_not_claim_not_found() {
        let page = render_unavailable_page();
        assert!(page.contains("Unable to load certificate"));
        assert!(!page.contains("not found"));
    }

    #[test]
    fn not_found_page_escapes_id() {
        let page = render_not_found_page("<b>x</b>");
        assert!(page.contains("&lt;b&gt;x&lt;/b&gt;"));
    }
}
