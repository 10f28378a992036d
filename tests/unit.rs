//! Unit tests for core ebooktools functionality.
//!
//! Tests individual components in isolation without running the search pipeline.

use ebooktools::collector::Collector;
use ebooktools::error::Result;
use ebooktools::ocr::pages_to_process;
use ebooktools::prelude::*;
use ebooktools::reorder::reorder_content;
use ebooktools::split::FolderPattern;

mod common;
use common::setup_test_dirs;

/// Computes the ISBN-10 check character of nine digits.
fn isbn10_check(digits: &str) -> char {
    let sum: u32 = digits
        .chars()
        .enumerate()
        .map(|(i, c)| c.to_digit(10).unwrap() * (10 - i as u32))
        .sum();
    match (11 - sum % 11) % 11 {
        10 => 'X',
        d => char::from_digit(d, 10).unwrap(),
    }
}

#[test]
fn test_generated_isbn10_are_valid() {
    for body in ["030640615", "080442957", "155404295", "097522980", "843760494"] {
        let isbn = format!("{}{}", body, isbn10_check(body));
        assert!(is_isbn_valid(&isbn), "{} should be valid", isbn);
    }
    assert!(is_isbn_valid("097522980X"));
}

#[test]
fn test_single_digit_mutation_invalidates_isbn10() {
    let valid = "0306406152";
    let mut flipped = 0;
    let mut total = 0;
    for position in 0..10 {
        for digit in '0'..='9' {
            let original = valid.chars().nth(position).unwrap();
            if digit == original {
                continue;
            }
            let mutated: String = valid
                .chars()
                .enumerate()
                .map(|(i, c)| if i == position { digit } else { c })
                .collect();
            total += 1;
            if !is_isbn_valid(&mutated) {
                flipped += 1;
            }
        }
    }
    assert_eq!(flipped, total);
}

#[test]
fn test_isbn13_prefix_is_required() {
    assert!(is_isbn_valid("9783161484100"));
    assert!(is_isbn_valid("979-10-90636-07-1"));
    // Same weighted sum rule, but not a 978/979 prefix
    assert!(!is_isbn_valid("9773161484100"));
    assert!(!is_isbn_valid("1234567890128"));
}

#[test]
fn test_find_isbns_dedup_and_blacklist() {
    assert_eq!(
        find_isbns("ISBN 978-3-16-148410-0 and 978-3-16-148410-0 again", "\n"),
        "9783161484100"
    );
    assert_eq!(find_isbns("0123456789", "\n"), "");
    assert_eq!(find_isbns("0000000000 1111111111", "\n"), "");
}

#[test]
fn test_find_isbns_ignores_longer_digit_runs() {
    assert_eq!(find_isbns("order 1234567890306406152", "\n"), "");
    assert_eq!(find_isbns("ISBN:0306406152.", "\n"), "0306406152");
}

#[test]
fn test_reorder_scan_first_and_reverse_last() {
    let text = "A\nB\nC\nD\nE";
    assert_eq!(
        reorder_content(text, Some(ReorderLines::new(2, 2))),
        "A\nB\nE\nD\nC"
    );
    assert_eq!(reorder_content(text, None), text);
}

#[test]
fn test_reorder_short_text_has_no_tail() {
    let text = "A\nB\n";
    assert_eq!(reorder_content(text, Some(ReorderLines::new(400, 50))), text);
}

#[test]
fn test_ocr_page_plan() {
    assert_eq!(
        pages_to_process(10, Some(PageRestriction::new(2, 1))),
        vec![1, 2, 10]
    );
    assert_eq!(pages_to_process(4, None), vec![1, 2, 3, 4]);
}

#[test]
fn test_config_builder_validation() {
    let result = EbookToolsConfig::builder().isbn_direct_grep_files("(").build();
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Invalid isbn_direct_grep_files")
    );
}

#[test]
fn test_config_accepts_lookaround_isbn_regex() -> Result<()> {
    let config = EbookToolsConfig::builder()
        .isbn_regex(r"(?<![0-9])(-?9-?7[789]-?)?((-?[0-9]-?){9}[0-9xX])(?![0-9])")
        .build()?;
    assert_eq!(config.find_isbns("isbn 0-306-40615-2")?, "0306406152");
    Ok(())
}

#[test]
fn test_folder_pattern() -> Result<()> {
    let pattern = FolderPattern::parse("%05d000")?;
    assert_eq!(pattern.render(0), "00000000");
    assert_eq!(pattern.render(2), "00002000");
    Ok(())
}

#[tokio::test]
async fn test_collector_sorts_recursively() -> Result<()> {
    let test_dirs = setup_test_dirs("collector_sort").await;
    let source = &test_dirs.source_dir;
    tokio::fs::create_dir_all(source.join("b")).await?;
    tokio::fs::write(source.join("b").join("2.pdf"), "2").await?;
    tokio::fs::write(source.join("a.epub"), "a").await?;
    tokio::fs::write(source.join("a.epub.meta"), "meta").await?;

    let files = Collector::new(source, "meta", false).collect_files().await?;
    assert_eq!(files, vec![source.join("a.epub"), source.join("b").join("2.pdf")]);
    Ok(())
}
