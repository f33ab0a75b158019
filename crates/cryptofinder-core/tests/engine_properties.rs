use cryptofinder_core::{fallback_set, find_matches, scan, score, Catalog, DetectedAlgorithm};
use proptest::prelude::*;
use std::collections::HashSet;

fn names(detected: &[DetectedAlgorithm]) -> Vec<&str> {
    detected.iter().map(|d| d.name.as_str()).collect()
}

// ── 确定性 / 非空 / 唯一 / 分值范围 ─────────────────────────────────────

proptest! {
    #[test]
    fn scan_is_deterministic(content in proptest::collection::vec(any::<u8>(), 0..512)) {
        let catalog = Catalog::builtin().unwrap();
        prop_assert_eq!(scan(&content, &catalog), scan(&content, &catalog));
    }

    #[test]
    fn scan_is_never_empty_and_names_are_unique(content in "[ -~]{0,200}") {
        let catalog = Catalog::builtin().unwrap();
        let detected = scan(content.as_bytes(), &catalog);
        prop_assert!(!detected.is_empty());
        let unique: HashSet<&str> = names(&detected).into_iter().collect();
        prop_assert_eq!(unique.len(), detected.len());
    }

    #[test]
    fn results_follow_catalog_order(
        words in proptest::collection::vec(
            prop::sample::select(vec!["aes-256", "md5", "sha1", "rsa", "3des", "des", "p-384", "blowfish", "aes"]),
            1..8,
        )
    ) {
        let catalog = Catalog::builtin().unwrap();
        let content = words.join(" ");
        let detected = find_matches(content.as_bytes(), &catalog);
        let positions: Vec<usize> = detected
            .iter()
            .map(|d| catalog.entries().iter().position(|e| e.name() == d.name).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn score_stays_within_bounds(scores in proptest::collection::vec(0u8..=100, 1..30)) {
        let detected: Vec<DetectedAlgorithm> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| DetectedAlgorithm {
                name: format!("A{i}"),
                strength: cryptofinder_core::Strength::Secure,
                risk: cryptofinder_core::Risk::Low,
                score: *s,
            })
            .collect();
        let pct = score(&detected);
        prop_assert!(pct <= 100);
        prop_assert!(pct >= *scores.iter().min().unwrap());
        prop_assert!(pct <= *scores.iter().max().unwrap());
    }

    #[test]
    fn des_inside_identifiers_never_fires(pre in "[a-z0-9_]{1,6}", suf in "[a-z0-9_]{1,6}") {
        let catalog = Catalog::builtin().unwrap();
        let content = format!("{pre}des{suf}");
        let detected = find_matches(content.as_bytes(), &catalog);
        prop_assert!(!names(&detected).contains(&"DES"));
    }

    #[test]
    fn hyphenated_names_still_report_the_bare_token(
        pre in "[a-z]{1,6}-",
        token in prop::sample::select(vec![("md5", "MD5"), ("rsa", "RSA"), ("aes", "AES")]),
        suf in prop::sample::select(vec!["", "-gcm", "-pss", " ", "\x00"]),
    ) {
        let catalog = Catalog::builtin().unwrap();
        let content = format!("{pre}{}{suf}", token.0);
        let detected = find_matches(content.as_bytes(), &catalog);
        prop_assert!(names(&detected).contains(&token.1), "{content:?} -> {:?}", names(&detected));
    }
}

// ── 具体场景 ───────────────────────────────────────────────────────────

#[test]
fn bit_width_variants_are_reported_independently() {
    let catalog = Catalog::builtin().unwrap();
    let detected = scan(b"cipher suites: AES-256-GCM, AES-128-CBC", &catalog);
    assert_eq!(names(&detected), vec!["AES-256", "AES-128"]);
}

#[test]
fn triple_des_does_not_also_report_des() {
    let catalog = Catalog::builtin().unwrap();
    assert_eq!(names(&scan(b"legacy 3DES module", &catalog)), vec!["3DES"]);
    assert_eq!(names(&scan(b"TRIPLE_DES", &catalog)), vec!["3DES"]);
    assert_eq!(names(&scan(b"3des and single des", &catalog)), vec!["3DES", "DES"]);
}

#[test]
fn hyphen_is_a_leading_boundary() {
    let catalog = Catalog::builtin().unwrap();
    assert_eq!(names(&scan(b"HMAC-MD5", &catalog)), vec!["MD5"]);
    assert_eq!(names(&scan(b"auth: hmac-md5", &catalog)), vec!["MD5"]);
    assert_eq!(names(&scan(b"ECDHE-RSA-CHACHA20-POLY1305", &catalog)), vec!["RSA"]);
    assert_eq!(names(&scan(b"RSA-PSS signature", &catalog)), vec!["RSA"]);
    assert_eq!(names(&scan(b"AES-GCM", &catalog)), vec!["AES"]);
}

#[test]
fn bit_width_suffix_and_digit_prefix_keep_the_bare_token_quiet() {
    let catalog = Catalog::builtin().unwrap();
    assert_eq!(names(&scan(b"aes-256", &catalog)), vec!["AES-256"]);
    assert_eq!(names(&scan(b"3des", &catalog)), vec!["3DES"]);
    assert_eq!(names(&scan(b"triple-des", &catalog)), vec!["3DES"]);
    assert_eq!(names(&scan(b"DES-EDE3-CBC", &catalog)), vec!["3DES"]);
}

#[test]
fn designed_is_not_des() {
    let catalog = Catalog::builtin().unwrap();
    let detected = scan(b"designed for speed", &catalog);
    assert_eq!(detected, fallback_set());
}

#[test]
fn multiple_forms_of_one_name_appear_once() {
    let catalog = Catalog::builtin().unwrap();
    let detected = scan(b"ECC elliptic curve Elliptic Curve ecc", &catalog);
    assert_eq!(names(&detected), vec!["ECC"]);
}

#[test]
fn binary_image_with_embedded_strings() {
    let catalog = Catalog::builtin().unwrap();
    let mut image = vec![0u8; 4096];
    // 标识符内部的 md5 不计入
    image.extend_from_slice(b"\x00mbedtls_md5_starts\x00");
    image.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    image.extend_from_slice(b"\x00secp256r1\x00RSA\x00");
    image.extend(std::iter::repeat(0xffu8).take(2048));
    let detected = scan(&image, &catalog);
    assert_eq!(names(&detected), vec!["RSA", "ECC-256"]);
}

#[test]
fn end_to_end_percentage() {
    let catalog = Catalog::builtin().unwrap();
    let detected = scan(b"using aes-256 and sha1 for legacy compat", &catalog);
    assert_eq!(score(&detected), 65);
}
