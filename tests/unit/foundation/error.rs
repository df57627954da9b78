use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LxError::configuration("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(
        LxError::invalid_input("x")
            .to_string()
            .contains("invalid input:")
    );
    assert!(
        LxError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LxError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn anyhow_context_converts_with_question_mark() {
    fn bind() -> LxResult<()> {
        let res: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken"));
        anyhow::Context::context(res, "bind udp socket")?;
        Ok(())
    }

    let err = bind().unwrap_err();
    assert!(matches!(err, LxError::Other(_)));
    assert!(err.to_string().contains("bind udp socket"));
}
