//! End-to-end tree construction, transactions, and addressed mutation

use std::cell::RefCell;
use std::rc::Rc;
use transcript_model::{
    Chapter, ChildLink, Document, Element, ElementRef, ListChange, Paragraph, Phrase,
    PositionAddress, Section, Timecode,
};

fn phrase(begin: u64, end: u64, text: &str) -> Phrase {
    Phrase::timed(
        Timecode::from_millis(begin),
        Timecode::from_millis(end),
        text,
    )
}

/// 1 chapter / 1 section / 2 paragraphs / 3 phrases.
fn populate(doc: &mut Document) {
    doc.append_chapter(Chapter::new("intro"));
    doc.append_section(Section::new("opening")).unwrap();
    doc.append_paragraph(Paragraph::new()).unwrap();
    doc.append_phrase(phrase(0, 1_000, "good ")).unwrap();
    doc.append_phrase(phrase(1_000, 2_000, "morning")).unwrap();
    doc.append_paragraph(Paragraph::new()).unwrap();
    doc.append_phrase(phrase(2_000, 3_000, "everyone")).unwrap();
}

fn shape(doc: &Document) -> (usize, usize, usize, usize) {
    (
        doc.chapters().len(),
        doc.sections().count(),
        doc.paragraphs().count(),
        doc.phrases().count(),
    )
}

#[test]
fn test_transactional_build_equals_reference_build() {
    let mut reference = Document::new();
    populate(&mut reference);

    let mut transactional = Document::new();
    transactional.begin_loading();
    populate(&mut transactional);
    transactional.end_loading();

    assert_eq!(shape(&reference), shape(&transactional));
    assert_eq!(shape(&transactional), (1, 1, 2, 3));

    for doc in [&reference, &transactional] {
        for (ci, chapter) in doc.chapters().iter().enumerate() {
            assert_eq!(chapter.parent_index(), Some(ci));
            for (si, section) in chapter.sections().iter().enumerate() {
                assert_eq!(section.parent_index(), Some(si));
                for (pi, paragraph) in section.paragraphs().iter().enumerate() {
                    assert_eq!(paragraph.parent_index(), Some(pi));
                    for (fi, phrase) in paragraph.phrases().iter().enumerate() {
                        assert_eq!(phrase.parent_index(), Some(fi));
                    }
                }
            }
        }
    }

    assert_eq!(reference.inner_text(), transactional.inner_text());
}

#[test]
fn test_bulk_load_dispatches_nothing() {
    let batches = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&batches);

    let mut doc = Document::new();
    doc.chapters_mut()
        .updates_mut()
        .set_listener(move |_batch: Vec<ListChange<Chapter>>| *sink.borrow_mut() += 1);

    doc.begin_loading();
    populate(&mut doc);
    doc.end_loading();

    assert_eq!(*batches.borrow(), 0);

    // After the load, mutations dispatch again.
    doc.append_chapter(Chapter::new("extra"));
    assert_eq!(*batches.borrow(), 1);
}

#[test]
fn test_mutations_in_one_transaction_dispatch_one_batch_in_call_order() {
    let mut doc = Document::new();
    populate(&mut doc);

    let batches: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&batches);

    let section = doc.chapters_mut()[0].sections_mut().get_mut(0).unwrap();
    section
        .paragraphs_mut()
        .updates_mut()
        .set_listener(move |batch: Vec<ListChange<Paragraph>>| {
            let kinds = batch
                .iter()
                .map(|change| match change {
                    ListChange::Inserted { index } => format!("ins@{index}"),
                    ListChange::Removed { index, .. } => format!("rem@{index}"),
                    ListChange::Replaced { index, .. } => format!("rep@{index}"),
                })
                .collect();
            sink.borrow_mut().push(kinds);
        });

    let list = section.paragraphs_mut();
    list.updates_mut().begin_transaction(true);
    list.push(Paragraph::new());
    list.insert(0, Paragraph::new()).unwrap();
    list.set(1, Paragraph::new()).unwrap();
    list.remove_at(0).unwrap();
    assert!(batches.borrow().is_empty());
    list.updates_mut().end_transaction();

    assert_eq!(
        *batches.borrow(),
        vec![vec![
            "ins@2".to_string(),
            "ins@0".to_string(),
            "rep@1".to_string(),
            "rem@0".to_string(),
        ]]
    );
}

#[test]
fn test_removed_paragraph_travels_in_record_and_reverts() {
    let mut doc = Document::new();
    populate(&mut doc);

    let captured: Rc<RefCell<Vec<ListChange<Paragraph>>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&captured);
    {
        let section = doc.chapters_mut()[0].sections_mut().get_mut(0).unwrap();
        section
            .paragraphs_mut()
            .updates_mut()
            .set_listener(move |mut batch| sink.borrow_mut().append(&mut batch));
    }

    doc.remove_element(PositionAddress::paragraph(0, 0, 0))
        .unwrap();
    assert_eq!(doc.paragraphs().count(), 1);

    let record = captured.borrow_mut().pop().unwrap();
    match &record {
        ListChange::Removed { index, old } => {
            assert_eq!(*index, 0);
            assert_eq!(old.text(), "good morning");
            assert_eq!(old.parent_index(), None);
        }
        other => panic!("expected Removed, got {:?}", other),
    }

    let section = doc.chapters_mut()[0].sections_mut().get_mut(0).unwrap();
    section.paragraphs_mut().revert(record).unwrap();

    assert_eq!(doc.paragraphs().count(), 2);
    let restored = doc
        .paragraph_at(PositionAddress::paragraph(0, 0, 0))
        .unwrap();
    assert_eq!(restored.text(), "good morning");
    assert_eq!(restored.parent_index(), Some(0));
    let shifted = doc
        .paragraph_at(PositionAddress::paragraph(0, 0, 1))
        .unwrap();
    assert_eq!(shifted.parent_index(), Some(1));
}

#[test]
fn test_addressed_round_trip_across_levels() -> anyhow::Result<()> {
    let mut doc = Document::new();
    populate(&mut doc);

    // Insert a second section by address, then a paragraph inside it.
    doc.insert_element(PositionAddress::section(0, 1), Element::Section(Section::new("qa")))?;
    doc.insert_element(
        PositionAddress::paragraph(0, 1, 0),
        Element::Paragraph(Paragraph::from_phrases([phrase(3_000, 4_000, "questions?")])),
    )?;

    match doc.element_at(PositionAddress::section(0, 1))? {
        ElementRef::Section(section) => assert_eq!(section.name(), "qa"),
        other => panic!("expected section, got {:?}", other),
    }
    assert_eq!(
        doc.paragraph_at(PositionAddress::paragraph(0, 1, 0))?.text(),
        "questions?"
    );

    // Replace the new paragraph, then remove it again.
    doc.set_element(
        PositionAddress::paragraph(0, 1, 0),
        Element::Paragraph(Paragraph::from_phrases([phrase(3_000, 4_000, "comments?")])),
    )?;
    assert_eq!(
        doc.paragraph_at(PositionAddress::paragraph(0, 1, 0))?.text(),
        "comments?"
    );

    doc.remove_element(PositionAddress::paragraph(0, 1, 0))?;
    assert!(doc
        .chapters()
        .get(0)
        .unwrap()
        .sections()
        .get(1)
        .unwrap()
        .paragraphs()
        .is_empty());
    Ok(())
}

#[test]
fn test_scalar_edits_inside_entity_transaction_coalesce() {
    let mut doc = Document::new();
    populate(&mut doc);

    let batches: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&batches);

    let phrase = doc.chapters_mut()[0]
        .sections_mut()
        .get_mut(0)
        .unwrap()
        .paragraphs_mut()
        .get_mut(0)
        .unwrap()
        .phrases_mut()
        .get_mut(0)
        .unwrap();
    phrase
        .updates_mut()
        .set_listener(move |batch| sink.borrow_mut().push(batch.len()));

    phrase.updates_mut().begin_transaction(true);
    phrase.set_text("good ");
    phrase.set_begin(Timecode::from_millis(10));
    phrase.set_end(Timecode::from_millis(990));
    phrase.updates_mut().end_transaction();

    assert_eq!(*batches.borrow(), vec![3]);
}
