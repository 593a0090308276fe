pub mod apply;
pub mod export;
pub mod indent;
pub mod ocr;
pub mod pages;
pub mod run;
