use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use mnemo_message::{Message, MessageConverter, MessageFormat, WireMessage};

use crate::backend::StorageBackend;
use crate::error::{Result, StorageError};
use crate::models::{
    advance, GetMessages, Resource, SaveMessages, Thread, ThreadOrder, UpdateResource, UpdateThread,
};
use crate::pagination::{Page, Pagination};
use crate::record::{from_record, to_record, Filter};
use crate::schema::TableName;

use super::decode_all;

/// Threads, resources and messages on top of any [`StorageBackend`]
///
/// Messages are stored in the canonical structured format and converted to
/// the caller's wire format on the way in and out.
#[derive(Clone)]
pub struct ConversationStore {
    backend: Arc<dyn StorageBackend>,
}

impl ConversationStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    // ---- threads ----

    /// Upsert a thread by id
    pub async fn save_thread(&self, thread: Thread) -> Result<Thread> {
        self.backend.insert(TableName::Threads, to_record(&thread)?).await?;
        tracing::debug!(thread_id = %thread.id, resource_id = %thread.resource_id, "Saved thread");
        Ok(thread)
    }

    pub async fn get_thread_by_id(&self, id: &str) -> Result<Option<Thread>> {
        self.backend
            .load(TableName::Threads, &Filter::by("id", id))
            .await?
            .map(from_record)
            .transpose()
    }

    pub async fn get_threads_by_resource_id(
        &self,
        resource_id: &str,
        order: ThreadOrder,
    ) -> Result<Vec<Thread>> {
        let records = self
            .backend
            .select(TableName::Threads, &Filter::by("resourceId", resource_id))
            .await?;

        let mut threads: Vec<Thread> = decode_all(records)?;
        order.sort(&mut threads);
        Ok(threads)
    }

    pub async fn get_threads_by_resource_id_paginated(
        &self,
        resource_id: &str,
        order: ThreadOrder,
        pagination: Pagination,
    ) -> Result<Page<Thread>> {
        pagination.validate()?;
        let threads = self.get_threads_by_resource_id(resource_id, order).await?;
        Page::paginate(threads, pagination)
    }

    /// Partial update; returns `None` when the thread does not exist
    pub async fn update_thread(&self, update: UpdateThread) -> Result<Option<Thread>> {
        let Some(mut thread) = self.get_thread_by_id(&update.id).await? else {
            return Ok(None);
        };

        if let Some(title) = update.title {
            thread.title = Some(title);
        }
        if let Some(metadata) = update.metadata {
            crate::models::merge_metadata(&mut thread.metadata, metadata);
        }
        thread.updated_at = advance(thread.updated_at);

        self.save_thread(thread).await.map(Some)
    }

    /// Delete a thread together with all of its messages
    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let messages = self
            .backend
            .delete(TableName::Messages, &Filter::by("threadId", thread_id))
            .await?;
        let threads = self
            .backend
            .delete(TableName::Threads, &Filter::by("id", thread_id))
            .await?;

        tracing::debug!(thread_id, messages, threads, "Deleted thread");
        Ok(())
    }

    // ---- resources ----

    pub async fn get_resource_by_id(&self, id: &str) -> Result<Option<Resource>> {
        self.backend
            .load(TableName::Resources, &Filter::by("id", id))
            .await?
            .map(from_record)
            .transpose()
    }

    /// Merge an update into a resource, creating it on first reference
    ///
    /// Metadata is shallow-merged and working memory is only replaced when
    /// supplied. Concurrent callers get last-write-wins on the whole row.
    pub async fn update_resource(&self, update: UpdateResource) -> Result<Resource> {
        let mut resource = match self.get_resource_by_id(&update.resource_id).await? {
            Some(existing) => existing,
            None => {
                tracing::debug!(resource_id = %update.resource_id, "Creating resource on first reference");
                Resource::new(update.resource_id.clone())
            }
        };

        resource.apply(update);
        self.backend.insert(TableName::Resources, to_record(&resource)?).await?;
        Ok(resource)
    }

    // ---- messages ----

    /// Persist messages of either wire format
    ///
    /// Every message is converted before anything is written, so one bad
    /// content part fails the call without a partial write. Unknown threads
    /// are created when the message names its resource, otherwise the call
    /// fails with [`StorageError::ThreadNotFound`].
    pub async fn save_messages(&self, input: SaveMessages) -> Result<Vec<WireMessage>> {
        if input.messages.is_empty() {
            return Ok(Vec::new());
        }

        let converter = MessageConverter::new();
        let canonical = input
            .messages
            .iter()
            .map(|message| converter.to_canonical(message))
            .collect::<std::result::Result<Vec<Message>, _>>()?;

        let mut threads = self.threads_for(&canonical).await?;

        let records = canonical.iter().map(to_record).collect::<Result<Vec<_>>>()?;
        self.backend.batch_insert(TableName::Messages, records).await?;

        for thread in threads.values_mut() {
            thread.updated_at = advance(thread.updated_at);
            self.backend.insert(TableName::Threads, to_record(&*thread)?).await?;
        }

        tracing::debug!(count = canonical.len(), threads = threads.len(), "Saved messages");

        canonical
            .iter()
            .map(|message| converter.to_wire(message, input.format).map_err(StorageError::from))
            .collect()
    }

    /// One page of a thread's messages in chronological order
    pub async fn get_messages(&self, query: GetMessages) -> Result<Page<WireMessage>> {
        query.pagination.validate()?;

        let messages = self.thread_messages(&query.thread_id).await?;
        let converter = MessageConverter::new();

        Page::paginate(messages, query.pagination)?
            .try_map(|message| converter.to_wire(&message, query.format))
            .map_err(StorageError::from)
    }

    /// The most recent `last` messages, oldest first
    pub async fn get_last_messages(
        &self,
        thread_id: &str,
        last: usize,
        format: MessageFormat,
    ) -> Result<Vec<WireMessage>> {
        let messages = self.thread_messages(thread_id).await?;
        let skip = messages.len().saturating_sub(last);
        let converter = MessageConverter::new();

        messages
            .into_iter()
            .skip(skip)
            .map(|message| converter.to_wire(&message, format).map_err(StorageError::from))
            .collect()
    }

    /// Delete messages by id and touch the threads they belonged to
    pub async fn delete_messages(&self, ids: &[&str]) -> Result<u64> {
        let mut touched = BTreeSet::new();
        let mut deleted = 0;

        for &id in ids {
            let key = Filter::by("id", id);
            if let Some(record) = self.backend.load(TableName::Messages, &key).await? {
                let message: Message = from_record(record)?;
                touched.insert(message.thread_id);
                deleted += self.backend.delete(TableName::Messages, &key).await?;
            }
        }

        for thread_id in touched {
            if let Some(mut thread) = self.get_thread_by_id(&thread_id).await? {
                thread.updated_at = advance(thread.updated_at);
                self.save_thread(thread).await?;
            }
        }

        Ok(deleted)
    }

    async fn thread_messages(&self, thread_id: &str) -> Result<Vec<Message>> {
        let records = self
            .backend
            .select(TableName::Messages, &Filter::by("threadId", thread_id))
            .await?;

        let mut messages: Vec<Message> = decode_all(records)?;
        // Stable sort: equal timestamps keep insertion order
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    /// Resolve (or implicitly create) the owning thread of every message
    async fn threads_for(&self, messages: &[Message]) -> Result<HashMap<String, Thread>> {
        let mut threads: HashMap<String, Thread> = HashMap::new();

        for message in messages {
            if threads.contains_key(&message.thread_id) {
                continue;
            }

            let thread = match self.get_thread_by_id(&message.thread_id).await? {
                Some(thread) => thread,
                None => match message.resource_id.as_deref() {
                    Some(resource_id) => {
                        tracing::debug!(thread_id = %message.thread_id, resource_id, "Creating thread implicitly");
                        Thread::new(message.thread_id.clone(), resource_id)
                    }
                    None => return Err(StorageError::ThreadNotFound(message.thread_id.clone())),
                },
            };
            threads.insert(message.thread_id.clone(), thread);
        }

        Ok(threads)
    }
}
