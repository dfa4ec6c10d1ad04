//! Canned OCR text and model responses for processing tests
#![allow(dead_code)]

/// One uploaded document and what the fake model says about it.
#[derive(Debug, Clone)]
pub struct LectureFixture {
    pub filename: &'static str,
    /// Text the fake extractor returns for this file
    pub ocr_text: &'static str,
    /// Phrase that appears in the chunk prompt for this document
    pub marker: &'static str,
    /// Raw chat-completion content returned for the chunk
    pub response: &'static str,
    pub expected_cards: usize,
}

pub const LECTURE1: LectureFixture = LectureFixture {
    filename: "lecture1.pdf",
    ocr_text: "1\n\
Convex sets contain every segment between two of their points.\n\
A convex function lies below its chords.\n\
Local minima of convex functions are global minima.\n",
    marker: "Convex sets contain",
    response: "Here are your flashcards:\n\
\n\
Q: What defines a convex set?\n\
A: It contains the line segment between any two of its points.\n\
\n\
Q: How does a convex function relate to its chords?\n\
A: The function lies on or below every chord.\n\
\n\
Q: Why are local minima of convex functions special?\n\
A: Every local minimum is also a global minimum.\n",
    expected_cards: 3,
};

pub const LECTURE2: LectureFixture = LectureFixture {
    filename: "lecture2.pdf",
    ocr_text: "Gradient descent moves against the gradient.\n\
The step size controls how far each iteration travels.\n",
    marker: "Gradient descent moves",
    response: "1. Q: In which direction does gradient descent move?\n\
A: Opposite to the gradient of the objective.\n\
2. Q: What does the step size control?\n\
A: The distance travelled in each iteration.\n",
    expected_cards: 2,
};

/// A document whose model response contains no usable cards.
pub const UNPARSEABLE: LectureFixture = LectureFixture {
    filename: "scanned.pdf",
    ocr_text: "Blurry scan of handwritten duality notes.\n",
    marker: "Blurry scan",
    response: "I am sorry, I cannot read this document.",
    expected_cards: 0,
};

pub const SAMPLE_CSV_CARDS: &[(&str, &str)] = &[
    ("What is a Lagrangian?", "The objective plus weighted constraints."),
    ("State weak duality.", "The dual optimum bounds the primal optimum from below."),
];

/// Minimal bytes that pass the upload check; the fake extractor never parses them.
pub const FAKE_PDF_BYTES: &[u8] = b"%PDF-1.4\n%fake\n";
