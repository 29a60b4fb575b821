// src/macros.rs
#[macro_export]
macro_rules! s {
    // String shorthand!
    () => {
        ::std::string::String::new()
    };
    ($expr:expr) => {
        ::std::string::String::from($expr)
    };
}

#[macro_export]
macro_rules! join {
    // Concatenate string slices into one owned String.
    ($first:expr $(, $rest:expr)+ $(,)?) => {{
        let mut s = ::std::string::String::from($first);
        $(
            s.push_str($rest);
        )+
        s
    }};
}

/// Build a table row (`Vec<String>`) from anything `Display`.
#[macro_export]
macro_rules! cells {
    ($($cell:expr),* $(,)?) => {
        vec![$(::std::string::ToString::to_string(&$cell)),*]
    };
}

/// Header row from string literals.
#[macro_export]
macro_rules! headers {
    ($($name:literal),* $(,)?) => {
        vec![$(::std::string::String::from($name)),*]
    };
}
