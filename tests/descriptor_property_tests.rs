//! Property tests for localized field resolution in descriptor parsing

use modstacker::services::DescriptorParser;
use proptest::prelude::*;

const LANGUAGES: &[&str] = &["de", "fr", "pl", "cz", "it", "es", "nl", "jp"];

fn document(titles: &[(String, String)], description: &str) -> String {
    let mut title_xml = String::new();
    for (language, text) in titles {
        title_xml.push_str(&format!("<{language}>{text}</{language}>"));
    }
    format!(
        "<modDesc><author>a</author><version>1</version>\
         <title>{title_xml}</title>\
         <description><en>{description}</en></description>\
         <iconFilename>icon.dds</iconFilename></modDesc>"
    )
}

fn entries() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::sample::subsequence(LANGUAGES.to_vec(), 1..LANGUAGES.len()).prop_flat_map(|languages| {
        let count = languages.len();
        (
            Just(languages),
            proptest::collection::vec("[A-Za-z][A-Za-z0-9 ]{0,15}[A-Za-z0-9]", count),
        )
            .prop_map(|(languages, texts)| {
                languages
                    .into_iter()
                    .map(str::to_string)
                    .zip(texts)
                    .collect::<Vec<_>>()
            })
    })
}

proptest! {
    #[test]
    fn preferred_language_is_chosen(titles in entries(), pick in any::<prop::sample::Index>()) {
        let (language, expected) = pick.get(&titles).clone();
        let xml = document(&titles, "d");

        let descriptor = DescriptorParser::new(language).parse(xml.as_bytes()).unwrap();
        prop_assert_eq!(descriptor.title, expected);
    }

    #[test]
    fn english_is_the_fallback(mut titles in entries(), english in "[A-Za-z]{1,12}", at in any::<prop::sample::Index>()) {
        let position = at.index(titles.len() + 1);
        titles.insert(position, ("en".to_string(), english.clone()));
        let xml = document(&titles, "d");

        let descriptor = DescriptorParser::new("sv").parse(xml.as_bytes()).unwrap();
        prop_assert_eq!(descriptor.title, english);
    }

    #[test]
    fn first_entry_without_english(titles in entries()) {
        let xml = document(&titles, "d");

        let descriptor = DescriptorParser::new("sv").parse(xml.as_bytes()).unwrap();
        prop_assert_eq!(&descriptor.title, &titles[0].1);
    }

    #[test]
    fn description_is_trimmed(
        text in "[A-Za-z][A-Za-z0-9 .,]{0,30}[A-Za-z0-9.]",
        before in "[ \t\n]{0,6}",
        after in "[ \t\n]{0,6}",
    ) {
        let titles = vec![("en".to_string(), "t".to_string())];
        let xml = document(&titles, &format!("{before}{text}{after}"));

        let descriptor = DescriptorParser::default().parse(xml.as_bytes()).unwrap();
        prop_assert_eq!(descriptor.description, text);
    }
}
