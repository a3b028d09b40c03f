use anyhow::Result;

mod common;
use common::create_test_buffer_pool;

use rookdb::storage::buffer::BufferPoolError;

#[test]
fn test_new_page() -> Result<()> {
    let (buffer_pool, _temp_file) = create_test_buffer_pool(10)?;

    // Create a new page; a standalone instance allocates 0, 1, 2, ...
    let (page, page_id) = buffer_pool.new_page()?;
    assert_eq!(page_id, 0);

    // Check that the page can be accessed and starts zeroed
    {
        let page_guard = page.read();
        assert_eq!(page_guard.page_id, page_id);
        assert!(page_guard.data.iter().all(|&b| b == 0));
    }

    buffer_pool.unpin_page(page_id, false)?;

    Ok(())
}

#[test]
fn test_page_ids_are_monotonic() -> Result<()> {
    let (buffer_pool, _temp_file) = create_test_buffer_pool(10)?;

    for expected in 0..5 {
        let (_, page_id) = buffer_pool.new_page()?;
        assert_eq!(page_id, expected);
        buffer_pool.unpin_page(page_id, false)?;
    }

    Ok(())
}

#[test]
fn test_fetch_page() -> Result<()> {
    let (buffer_pool, _temp_file) = create_test_buffer_pool(10)?;

    let (_, page_id) = buffer_pool.new_page()?;
    buffer_pool.unpin_page(page_id, false)?;

    let fetched_page = buffer_pool.fetch_page(page_id)?;
    {
        let page_guard = fetched_page.read();
        assert_eq!(page_guard.page_id, page_id);
    }

    buffer_pool.unpin_page(page_id, false)?;

    Ok(())
}

#[test]
fn test_page_modification_survives_eviction() -> Result<()> {
    // Pool of 3 so creating more pages forces eviction
    let (buffer_pool, _temp_file) = create_test_buffer_pool(3)?;

    let (page, page_id) = buffer_pool.new_page()?;
    {
        let mut page_guard = page.write();
        let test_data = b"Test Data";
        page_guard.data[100..100 + test_data.len()].copy_from_slice(test_data);
    }
    buffer_pool.unpin_page(page_id, true)?;

    // Push the dirty page out of the pool
    for _ in 0..3 {
        let (_, other_id) = buffer_pool.new_page()?;
        buffer_pool.unpin_page(other_id, false)?;
    }
    assert!(!buffer_pool.contains_page(page_id));

    // The write-back happened under the old page id; a fetch reads it back
    let fetched_page = buffer_pool.fetch_page(page_id)?;
    {
        let page_guard = fetched_page.read();
        let test_data = b"Test Data";
        assert_eq!(&page_guard.data[100..100 + test_data.len()], test_data);
    }
    buffer_pool.unpin_page(page_id, false)?;

    Ok(())
}

#[test]
fn test_pool_exhaustion_and_retry() -> Result<()> {
    let (buffer_pool, _temp_file) = create_test_buffer_pool(2)?;

    let (_, first_id) = buffer_pool.new_page()?;
    let (_, _second_id) = buffer_pool.new_page()?;

    // Every frame is pinned now
    let third = buffer_pool.new_page();
    assert!(matches!(third, Err(BufferPoolError::PoolExhausted)));

    // Releasing one pin makes the retry succeed
    buffer_pool.unpin_page(first_id, false)?;
    let (_, third_id) = buffer_pool.new_page()?;
    buffer_pool.unpin_page(third_id, false)?;

    Ok(())
}

#[test]
fn test_lru_eviction_order() -> Result<()> {
    let (buffer_pool, _temp_file) = create_test_buffer_pool(3)?;

    // Unpin in the order a, b, c; a becomes the coldest candidate
    let (_, a) = buffer_pool.new_page()?;
    let (_, b) = buffer_pool.new_page()?;
    let (_, c) = buffer_pool.new_page()?;
    buffer_pool.unpin_page(a, false)?;
    buffer_pool.unpin_page(b, false)?;
    buffer_pool.unpin_page(c, false)?;

    let (_, d) = buffer_pool.new_page()?;

    // The new page reused a's frame; b and c are still resident
    assert!(!buffer_pool.contains_page(a));
    assert!(buffer_pool.contains_page(b));
    assert!(buffer_pool.contains_page(c));
    assert!(buffer_pool.contains_page(d));

    buffer_pool.unpin_page(d, false)?;

    Ok(())
}

#[test]
fn test_fetch_refreshes_lru_position() -> Result<()> {
    let (buffer_pool, _temp_file) = create_test_buffer_pool(3)?;

    let (_, a) = buffer_pool.new_page()?;
    let (_, b) = buffer_pool.new_page()?;
    let (_, c) = buffer_pool.new_page()?;
    buffer_pool.unpin_page(a, false)?;
    buffer_pool.unpin_page(b, false)?;
    buffer_pool.unpin_page(c, false)?;

    // Touch a again; b becomes the coldest
    buffer_pool.fetch_page(a)?;
    buffer_pool.unpin_page(a, false)?;

    let (_, d) = buffer_pool.new_page()?;

    assert!(buffer_pool.contains_page(a));
    assert!(!buffer_pool.contains_page(b));
    assert!(buffer_pool.contains_page(c));

    buffer_pool.unpin_page(d, false)?;

    Ok(())
}

#[test]
fn test_unpin_errors() -> Result<()> {
    let (buffer_pool, _temp_file) = create_test_buffer_pool(10)?;

    // Unpinning a page that is not resident fails
    let missing = buffer_pool.unpin_page(42, false);
    assert!(matches!(missing, Err(BufferPoolError::PageNotFound(42))));

    // Unpinning below zero is a caller bug
    let (_, page_id) = buffer_pool.new_page()?;
    buffer_pool.unpin_page(page_id, false)?;
    let double = buffer_pool.unpin_page(page_id, false);
    assert!(matches!(double, Err(BufferPoolError::PageNotPinned(_))));

    Ok(())
}

#[test]
fn test_pin_count_round_trip() -> Result<()> {
    let (buffer_pool, _temp_file) = create_test_buffer_pool(10)?;

    let (_, page_id) = buffer_pool.new_page()?;

    // Two extra pins, three unpins total
    buffer_pool.fetch_page(page_id)?;
    buffer_pool.fetch_page(page_id)?;
    buffer_pool.unpin_page(page_id, false)?;
    buffer_pool.unpin_page(page_id, false)?;
    buffer_pool.unpin_page(page_id, false)?;

    // Pin count is zero again; a fourth unpin fails
    let extra = buffer_pool.unpin_page(page_id, false);
    assert!(matches!(extra, Err(BufferPoolError::PageNotPinned(_))));

    Ok(())
}

#[test]
fn test_flush_page() -> Result<()> {
    let (buffer_pool, _temp_file) = create_test_buffer_pool(10)?;

    let (page, page_id) = buffer_pool.new_page()?;
    {
        let mut page_guard = page.write();
        let test_data = b"Test Data For Flushing";
        page_guard.data[100..100 + test_data.len()].copy_from_slice(test_data);
    }
    buffer_pool.unpin_page(page_id, true)?;

    buffer_pool.flush_page(page_id)?;

    let fetched_page = buffer_pool.fetch_page(page_id)?;
    {
        let page_guard = fetched_page.read();
        let test_data = b"Test Data For Flushing";
        assert_eq!(&page_guard.data[100..100 + test_data.len()], test_data);
    }
    buffer_pool.unpin_page(page_id, false)?;

    // Flushing a page that is not resident fails
    let missing = buffer_pool.flush_page(999);
    assert!(matches!(missing, Err(BufferPoolError::PageNotFound(999))));

    Ok(())
}

#[test]
fn test_flush_all_pages() -> Result<()> {
    let (buffer_pool, _temp_file) = create_test_buffer_pool(10)?;

    let mut page_ids = Vec::new();
    for i in 0..5 {
        let (page, page_id) = buffer_pool.new_page()?;
        {
            let mut page_guard = page.write();
            let test_data = format!("Test Data {}", i).into_bytes();
            page_guard.data[100..100 + test_data.len()].copy_from_slice(&test_data);
        }
        buffer_pool.unpin_page(page_id, true)?;
        page_ids.push(page_id);
    }

    buffer_pool.flush_all_pages()?;

    for (i, &page_id) in page_ids.iter().enumerate() {
        let fetched_page = buffer_pool.fetch_page(page_id)?;
        {
            let page_guard = fetched_page.read();
            let expected_data = format!("Test Data {}", i).into_bytes();
            assert_eq!(
                &page_guard.data[100..100 + expected_data.len()],
                expected_data.as_slice()
            );
        }
        buffer_pool.unpin_page(page_id, false)?;
    }

    Ok(())
}

#[test]
fn test_delete_page_is_idempotent() -> Result<()> {
    let (buffer_pool, _temp_file) = create_test_buffer_pool(10)?;

    let (_, page_id) = buffer_pool.new_page()?;
    buffer_pool.unpin_page(page_id, false)?;

    buffer_pool.delete_page(page_id)?;
    assert!(!buffer_pool.contains_page(page_id));

    // The second delete is vacuous and also succeeds
    buffer_pool.delete_page(page_id)?;

    // The freed frame is reusable
    let (_, new_page_id) = buffer_pool.new_page()?;
    buffer_pool.unpin_page(new_page_id, false)?;

    Ok(())
}

#[test]
fn test_delete_pinned_page_fails() -> Result<()> {
    let (buffer_pool, _temp_file) = create_test_buffer_pool(10)?;

    let (_, page_id) = buffer_pool.new_page()?;

    let result = buffer_pool.delete_page(page_id);
    assert!(matches!(result, Err(BufferPoolError::PagePinned(_))));

    // Still resident and still usable after the failed delete
    assert!(buffer_pool.contains_page(page_id));
    buffer_pool.unpin_page(page_id, false)?;
    buffer_pool.delete_page(page_id)?;

    Ok(())
}
